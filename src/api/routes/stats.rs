use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::routes::events::load_event;
use crate::api::routes::teams::{load_roster, load_team};
use crate::api::state::AppState;
use crate::api::{require_manager, ApiError};
use crate::calculate::{derive_row, derive_rows};
use crate::import::parse_csv_str;
use crate::models::{Event, StatField, StatRow, StatRowId, StatTotals};
use crate::storage::{
    delete_stat_rows, read_event_rows, save_stat_rows, update_stat_field, SaveReport,
};

#[derive(Debug, Serialize)]
pub struct StatRowsResponse {
    pub rows: Vec<StatRow>,
    pub totals: StatTotals,
}

#[derive(Debug, Deserialize)]
pub struct SaveStatsRequest {
    pub rows: Vec<StatRow>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteStatsRequest {
    pub ids: Vec<StatRowId>,
}

#[derive(Debug, Serialize)]
pub struct DeleteStatsResponse {
    pub deleted: usize,
}

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    /// Store the parsed rows instead of only previewing them
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub rows: Vec<StatRow>,
    pub skipped: usize,
    pub unrecognized_headers: Vec<String>,
    pub report: Option<SaveReport>,
}

#[derive(Debug, Deserialize)]
pub struct EditStatRequest {
    /// Column id, snake_case or camelCase
    pub field: String,
    pub value: Option<f64>,
}

fn load_game(state: &AppState, team_id: &str, event_id: &str) -> Result<Event, ApiError> {
    let event = load_event(state, team_id, event_id)?;
    if !event.is_game() {
        return Err(ApiError::BadRequest(format!(
            "event {} is a {}, stats are only kept for games",
            event.id, event.kind
        )));
    }
    Ok(event)
}

/// An event's rows with derived columns filled in.
pub async fn list_stats(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
) -> Result<Json<StatRowsResponse>, ApiError> {
    let event = load_event(&state, &team_id, &event_id)?;
    let stored = read_event_rows(&state.storage, &team_id, &event.id)?;

    let mut totals = StatTotals::default();
    for row in &stored {
        totals.add_row(row);
    }

    let mut rows = derive_rows(&stored, state.config.stats.input_policy);
    rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Json(StatRowsResponse { rows, totals }))
}

pub async fn save_stats(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<SaveStatsRequest>,
) -> Result<Json<SaveReport>, ApiError> {
    require_manager(&headers)?;
    let event = load_game(&state, &team_id, &event_id)?;
    let roster = load_roster(&state, &team_id)?;

    let _guard = state.write_lock.lock().await;
    let report = save_stat_rows(&state.storage, &team_id, &event.id, req.rows, &roster);
    Ok(Json(report))
}

/// Bulk delete by row id. IDs outside this event are ignored.
pub async fn delete_stats(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<DeleteStatsRequest>,
) -> Result<Json<DeleteStatsResponse>, ApiError> {
    require_manager(&headers)?;
    let event = load_event(&state, &team_id, &event_id)?;

    let _guard = state.write_lock.lock().await;
    let ids: Vec<StatRowId> = read_event_rows(&state.storage, &team_id, &event.id)?
        .into_iter()
        .map(|r| r.id)
        .filter(|id| req.ids.contains(id))
        .collect();
    let deleted = delete_stat_rows(&state.storage, &team_id, &ids)?;

    Ok(Json(DeleteStatsResponse { deleted }))
}

/// Parse a CSV export sent as the request body.
///
/// Without `?save=true` nothing is written and the parsed rows come back
/// for review.
pub async fn import_stats(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
    Query(params): Query<ImportParams>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    require_manager(&headers)?;
    let event = load_game(&state, &team_id, &event_id)?;

    let sheet = parse_csv_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let policy = state.config.stats.input_policy;
    let preview = derive_rows(&sheet.rows, policy);

    let report = if params.save {
        let roster = load_roster(&state, &team_id)?;
        let _guard = state.write_lock.lock().await;
        Some(save_stat_rows(
            &state.storage,
            &team_id,
            &event.id,
            sheet.rows,
            &roster,
        ))
    } else {
        None
    };

    Ok(Json(ImportResponse {
        rows: preview,
        skipped: sheet.skipped,
        unrecognized_headers: sheet.unrecognized_headers,
        report,
    }))
}

/// Inline edit of one field. Editing a derived column pins its value.
pub async fn edit_stat(
    State(state): State<AppState>,
    Path((team_id, row_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<EditStatRequest>,
) -> Result<Json<StatRow>, ApiError> {
    require_manager(&headers)?;
    let field: StatField = req
        .field
        .parse()
        .map_err(|e: crate::models::UnknownField| ApiError::BadRequest(e.to_string()))?;

    load_team(&state, &team_id)?;

    let _guard = state.write_lock.lock().await;
    let row = update_stat_field(&state.storage, &team_id, &row_id.into(), field, req.value)?;
    Ok(Json(derive_row(&row, state.config.stats.input_policy)))
}

#[cfg(test)]
mod tests {
    use crate::api::state::AppState;
    use crate::api::testing::{get_json, send, send_json, setup_team};
    use crate::models::{Event, EventKind, Person, Role, Team};
    use crate::storage::{EntityType, JsonlWriter};
    use axum::body::Body;
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SHEET: &str = "\
Name,Attack K,Attack E,Attack TA,Sets Sets Played,Serve SA,Serve SE,Serve TA
Anna,10,2,20,3,2,1,12
Ben,4,0,10,3,,,
Team Total,14,2,30,3,2,1,12
";

    fn seed(state: &AppState, team: &Team, kind: EventKind) -> Event {
        let team_id = team.id.as_str();
        JsonlWriter::for_entity(&state.storage, EntityType::Person, team_id)
            .write_all(&[
                Person::new(team.id.clone(), "Anna".to_string(), Role::Player),
                Person::new(team.id.clone(), "Ben".to_string(), Role::Player),
            ])
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap();
        let event = Event::new(team.id.clone(), kind, "vs Lions".to_string(), date);
        JsonlWriter::for_entity(&state.storage, EntityType::Event, team_id)
            .append(&event)
            .unwrap();
        event
    }

    async fn import(state: &AppState, uri: &str, role: &str) -> (StatusCode, serde_json::Value) {
        send(state, "POST", uri, Some(role), Some(Body::from(SHEET))).await
    }

    #[tokio::test]
    async fn test_import_preview_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let event = seed(&state, &team, EventKind::Game);
        let base = format!("/api/teams/{}/events/{}/stats", team.id, event.id);

        let (status, json) = import(&state, &format!("{}/import", base), "coach").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["rows"][0]["attack_efficiency"], 0.4);
        assert_eq!(json["rows"][0]["kills_per_set"], 3.33);
        // Zero attack errors count as missing under the default policy
        assert!(json["rows"][1]["attack_efficiency"].is_null());
        assert!(json["report"].is_null());

        let (_, json) = get_json(&state, &base).await;
        assert!(json["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_and_save() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let event = seed(&state, &team, EventKind::Game);
        let base = format!("/api/teams/{}/events/{}/stats", team.id, event.id);

        let (status, json) = import(&state, &format!("{}/import?save=true", base), "admin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["report"]["saved"].as_array().unwrap().len(), 2);
        assert!(json["report"]["failed"].as_array().unwrap().is_empty());

        let (status, json) = get_json(&state, &base).await;
        assert_eq!(status, StatusCode::OK);
        let rows = json["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Anna");
        assert_eq!(rows[0]["serve_percentage"], 92.0);
        assert_eq!(json["totals"]["kills"], 14.0);
    }

    #[tokio::test]
    async fn test_import_rejects_player_and_non_game() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let training = seed(&state, &team, EventKind::Training);
        let uri = format!(
            "/api/teams/{}/events/{}/stats/import",
            team.id, training.id
        );

        let (status, _) = import(&state, &uri, "player").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = import(&state, &uri, "coach").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_save_reports_unknown_players() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let event = seed(&state, &team, EventKind::Game);
        let uri = format!("/api/teams/{}/events/{}/stats", team.id, event.id);

        let body = json!({"rows": [
            {"id": "0", "name": "Anna", "kills": 7},
            {"id": "1", "name": "Zed", "kills": 1},
        ]});
        let (status, json) = send_json(&state, "POST", &uri, "coach", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["saved"].as_array().unwrap().len(), 1);
        assert_eq!(json["failed"][0]["row_id"], "1");
        assert_eq!(json["failed"][0]["reason"], "Person not found: Zed");
    }

    #[tokio::test]
    async fn test_unknown_team_never_touches_outside_files() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let event = seed(&state, &team, EventKind::Game);

        // data/teams/../outside resolves to data/outside
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let stat_file = outside.join("stat_rows.jsonl");
        let line = "{\"id\":\"r1\",\"name\":\"Anna\",\"kills\":3.0}\n";
        std::fs::write(&stat_file, line).unwrap();

        let (status, _) = send_json(
            &state,
            "PATCH",
            "/api/teams/..%2Foutside/stats/r1",
            "admin",
            json!({"field": "kills", "value": 99}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(std::fs::read_to_string(&stat_file).unwrap(), line);

        let uri = format!("/api/teams/..%2Foutside/events/{}/stats", event.id);
        let (status, _) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/api/teams/..%2Foutside/events/{}/attendees", event.id);
        let (status, _) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_pins_derived_value_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let event = seed(&state, &team, EventKind::Game);
        let base = format!("/api/teams/{}/events/{}/stats", team.id, event.id);
        let (_, json) = import(&state, &format!("{}/import?save=true", base), "coach").await;
        let row_id = json["report"]["saved"][0].as_str().unwrap().to_string();

        let edit_uri = format!("/api/teams/{}/stats/{}", team.id, row_id);
        let (status, json) = send_json(
            &state,
            "PATCH",
            &edit_uri,
            "coach",
            json!({"field": "attackEfficiency", "value": 0.5}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["attack_efficiency"], 0.5);

        let (status, _) = send_json(
            &state,
            "PATCH",
            &edit_uri,
            "coach",
            json!({"field": "spikes", "value": 1}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, json) = get_json(&state, &base).await;
        assert_eq!(json["rows"][0]["attack_efficiency"], 0.5);

        let (status, json) =
            send_json(&state, "DELETE", &base, "admin", json!({"ids": [row_id, "other"]})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], 1);

        let (_, json) = get_json(&state, &base).await;
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_unknown_row() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let uri = format!("/api/teams/{}/stats/missing", team.id);
        let (status, _) =
            send_json(&state, "PATCH", &uri, "coach", json!({"field": "kills", "value": 3})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
