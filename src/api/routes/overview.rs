use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::routes::teams::load_team;
use crate::api::state::AppState;
use crate::api::{parse_date_param, ApiError};
use crate::calculate::{aggregate_range, filter_by_date, leaderboard as rank_players};
use crate::models::{DateRange, LeaderboardEntry, StatField, TeamAggregate};
use crate::storage::load_match_summaries;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub field: String,
    pub limit: Option<usize>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub field: StatField,
    pub date_range: DateRange,
    pub entries: Vec<LeaderboardEntry>,
}

fn resolve_range(
    state: &AppState,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<DateRange, ApiError> {
    let from = parse_date_param(from, "from")?;
    let to = parse_date_param(to, "to")?;
    let range = DateRange::from_bounds(
        from,
        to,
        chrono::Utc::now().date_naive(),
        state.config.stats.default_range_days,
    );
    if range.from > range.to {
        return Err(ApiError::BadRequest(format!(
            "from ({}) is after to ({})",
            range.from, range.to
        )));
    }
    Ok(range)
}

/// Team totals, record and per-match series over a date range.
pub async fn team_overview(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Query(params): Query<RangeParams>,
) -> Result<Json<TeamAggregate>, ApiError> {
    load_team(&state, &team_id)?;
    let range = resolve_range(&state, params.from.as_deref(), params.to.as_deref())?;
    let matches = load_match_summaries(&state.storage, &team_id)?;

    Ok(Json(aggregate_range(&matches, range)))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    load_team(&state, &team_id)?;
    let field: StatField = params
        .field
        .parse()
        .map_err(|e: crate::models::UnknownField| ApiError::BadRequest(e.to_string()))?;
    let range = resolve_range(&state, params.from.as_deref(), params.to.as_deref())?;
    let limit = params
        .limit
        .unwrap_or(state.config.stats.leaderboard_limit)
        .max(1);

    let matches = load_match_summaries(&state.storage, &team_id)?;
    let entries = rank_players(&filter_by_date(&matches, &range), field, limit);

    Ok(Json(LeaderboardResponse {
        field,
        date_range: range,
        entries,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::state::AppState;
    use crate::api::testing::{get_json, setup_team};
    use crate::models::{Event, EventKind, Person, Role, StatRow, Team};
    use crate::storage::{save_stat_rows, EntityType, JsonlWriter};
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    fn game(team: &Team, date: (i32, u32, u32), score: &str) -> Event {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        Event::new(team.id.clone(), EventKind::Game, "League".to_string(), date)
            .with_score(score.to_string())
    }

    fn line(name: &str, kills: f64, aces: f64) -> StatRow {
        let mut row = StatRow::new("0", name);
        row.kills = Some(kills);
        row.serve_aces = Some(aces);
        row.sets_played = Some(3.0);
        row
    }

    fn seed(state: &AppState, team: &Team) {
        let team_id = team.id.as_str();
        let roster = vec![
            Person::new(team.id.clone(), "Anna".to_string(), Role::Player),
            Person::new(team.id.clone(), "Ben".to_string(), Role::Player),
        ];
        JsonlWriter::for_entity(&state.storage, EntityType::Person, team_id)
            .write_all(&roster)
            .unwrap();

        let games = vec![
            game(team, (2025, 9, 6), "3-1"),
            game(team, (2025, 9, 13), "1-3"),
            game(team, (2025, 9, 20), "3-2"),
            game(team, (2024, 1, 10), "3-0"),
        ];
        JsonlWriter::for_entity(&state.storage, EntityType::Event, team_id)
            .write_all(&games)
            .unwrap();

        for (i, g) in games.iter().enumerate() {
            let kills = (i + 1) as f64;
            let rows = vec![line("Anna", kills * 2.0, 1.0), line("Ben", kills, 0.0)];
            save_stat_rows(&state.storage, team_id, &g.id, rows, &roster);
        }
    }

    #[tokio::test]
    async fn test_overview_for_range() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        seed(&state, &team);

        let uri = format!(
            "/api/teams/{}/overview?from=2025-09-01&to=2025-09-30",
            team.id
        );
        let (status, json) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matches"], 3);
        assert_eq!(json["wins"], 2);
        assert_eq!(json["losses"], 1);
        assert_eq!(json["win_percentage"], 66.67);
        // Anna 2+4+6, Ben 1+2+3
        assert_eq!(json["totals"]["kills"], 18.0);
        assert_eq!(json["series"].as_array().unwrap().len(), 3);
        assert_eq!(json["series"][0]["score"], 4.0);
        assert_eq!(json["date_range"]["from"], "2025-09-01");
    }

    #[tokio::test]
    async fn test_overview_rejects_inverted_range() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let uri = format!(
            "/api/teams/{}/overview?from=2025-10-01&to=2025-09-01",
            team.id
        );
        let (status, _) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_leaderboard() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        seed(&state, &team);

        let uri = format!(
            "/api/teams/{}/leaderboard?field=kills&from=2024-01-01&to=2025-12-31&limit=1",
            team.id
        );
        let (status, json) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::OK);
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "Anna");
        assert_eq!(entries[0]["matches"], 4);
        assert_eq!(entries[0]["value"], 20.0);

        let uri = format!("/api/teams/{}/leaderboard?field=bogus", team.id);
        let (status, _) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
