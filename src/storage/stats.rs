//! Stat row persistence.
//!
//! Saving is row by row: every row is resolved and written on its own, so a
//! batch can end half-saved. [`SaveReport`] tells the caller which rows made
//! it and why the others did not.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use super::{
    entity_path, remove_where, upsert_by, EntityType, JsonlReader, StorageConfig, StorageError,
};
use crate::models::{
    EntityId, Event, EventId, MatchSummary, Person, StatField, StatRow, StatRowId,
};
use crate::roster::link_row;

/// A row that could not be saved.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// ID the row arrived with (sheet index for imports)
    pub row_id: String,
    pub name: String,
    pub reason: String,
}

/// Outcome of a multi-row save.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub saved: Vec<StatRowId>,
    pub failed: Vec<RowFailure>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stable ID of a player's line in a game.
pub fn stat_row_id(event_id: &EventId, row: &StatRow) -> StatRowId {
    match &row.person_id {
        Some(person_id) => EntityId::generate(&[event_id.as_str(), person_id.as_str()]),
        None => EntityId::generate(&[event_id.as_str(), "name", row.name.trim()]),
    }
}

/// All stat rows of a team.
pub fn read_stat_rows(config: &StorageConfig, team_id: &str) -> Result<Vec<StatRow>, StorageError> {
    JsonlReader::for_entity(config, EntityType::StatRow, team_id).read_all()
}

/// Stat rows recorded for one event.
pub fn read_event_rows(
    config: &StorageConfig,
    team_id: &str,
    event_id: &EventId,
) -> Result<Vec<StatRow>, StorageError> {
    JsonlReader::for_entity(config, EntityType::StatRow, team_id)
        .read_where(|r: &StatRow| r.event_id.as_ref() == Some(event_id))
}

/// Resolve and upsert each row against `event_id`.
///
/// A row failing name resolution or the write is reported and skipped;
/// rows before and after it are still saved.
pub fn save_stat_rows(
    config: &StorageConfig,
    team_id: &str,
    event_id: &EventId,
    rows: Vec<StatRow>,
    roster: &[Person],
) -> SaveReport {
    let path = entity_path(config, EntityType::StatRow, team_id);
    let mut report = SaveReport::default();

    for mut row in rows {
        let incoming_id = row.id.to_string();

        if let Err(e) = link_row(&mut row, roster) {
            warn!("Skipping stat row {} ({}): {}", incoming_id, row.name, e);
            report.failed.push(RowFailure {
                row_id: incoming_id,
                name: row.name.clone(),
                reason: e.to_string(),
            });
            continue;
        }

        row.event_id = Some(event_id.clone());
        row.id = stat_row_id(event_id, &row);
        let id = row.id.clone();
        let name = row.name.clone();

        match upsert_by(&path, row, |r: &StatRow| r.id.clone()) {
            Ok(_) => report.saved.push(id),
            Err(e) => {
                warn!("Failed to write stat row {} ({}): {}", incoming_id, name, e);
                report.failed.push(RowFailure {
                    row_id: incoming_id,
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Saved {} stat rows for event {} ({} failed)",
        report.saved.len(),
        event_id,
        report.failed.len()
    );
    report
}

/// Set one field of a stored row. Editing a derived field stores it,
/// making it authoritative over recomputation.
pub fn update_stat_field(
    config: &StorageConfig,
    team_id: &str,
    row_id: &StatRowId,
    field: StatField,
    value: Option<f64>,
) -> Result<StatRow, StorageError> {
    let path = entity_path(config, EntityType::StatRow, team_id);
    let mut row = JsonlReader::<StatRow>::new(path.clone())
        .read_all()?
        .into_iter()
        .find(|r| &r.id == row_id)
        .ok_or_else(|| StorageError::NotFound(format!("stat row {}", row_id)))?;

    row.set(field, value);
    upsert_by(&path, row.clone(), |r: &StatRow| r.id.clone())?;
    Ok(row)
}

/// Delete the selected rows. Unknown IDs are ignored.
pub fn delete_stat_rows(
    config: &StorageConfig,
    team_id: &str,
    ids: &[StatRowId],
) -> Result<usize, StorageError> {
    let path = entity_path(config, EntityType::StatRow, team_id);
    let removed = remove_where(&path, |r: &StatRow| ids.contains(&r.id))?;
    info!("Deleted {} stat rows from team {}", removed, team_id);
    Ok(removed)
}

/// Delete every row of an event.
pub fn delete_event_rows(
    config: &StorageConfig,
    team_id: &str,
    event_id: &EventId,
) -> Result<usize, StorageError> {
    let path = entity_path(config, EntityType::StatRow, team_id);
    remove_where(&path, |r: &StatRow| r.event_id.as_ref() == Some(event_id))
}

/// Every game of a team joined with its stat rows.
pub fn load_match_summaries(
    config: &StorageConfig,
    team_id: &str,
) -> Result<Vec<MatchSummary>, StorageError> {
    let games = JsonlReader::<Event>::for_entity(config, EntityType::Event, team_id)
        .read_where(Event::is_game)?;

    let mut rows_by_event: HashMap<EventId, Vec<StatRow>> = HashMap::new();
    for row in read_stat_rows(config, team_id)? {
        if let Some(event_id) = row.event_id.clone() {
            rows_by_event.entry(event_id).or_default().push(row);
        }
    }

    Ok(games
        .iter()
        .map(|game| {
            let rows = rows_by_event.remove(&game.id).unwrap_or_default();
            MatchSummary::from_event(game, rows)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, Role};
    use crate::storage::JsonlWriter;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StorageConfig, Vec<Person>) {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let roster = vec![
            Person::new("t1".into(), "Alice".to_string(), Role::Player),
            Person::new("t1".into(), "Bo".to_string(), Role::Player),
            Person::new("t1".into(), "Bo".to_string(), Role::Player),
        ];
        (temp_dir, config, roster)
    }

    fn sheet_row(index: &str, name: &str, kills: f64) -> StatRow {
        let mut row = StatRow::new(index, name);
        row.kills = Some(kills);
        row
    }

    #[test]
    fn test_save_reports_partial_failure() {
        let (_tmp, config, roster) = setup();
        let event: EventId = "g1".into();

        let report = save_stat_rows(
            &config,
            "t1",
            &event,
            vec![
                sheet_row("0", "Alice", 10.0),
                sheet_row("1", "Bo", 4.0),
                sheet_row("2", "Zed", 1.0),
            ],
            &roster,
        );

        assert!(!report.is_complete());
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].row_id, "1");
        assert_eq!(report.failed[0].reason, "Multiple persons found: Bo");
        assert_eq!(report.failed[1].reason, "Person not found: Zed");

        let stored = read_event_rows(&config, "t1", &event).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].person_id, Some(roster[0].id.clone()));
        assert_eq!(stored[0].event_id, Some(event));
    }

    #[test]
    fn test_malformed_cell_stays_nan_after_save() {
        let (_tmp, config, roster) = setup();
        let event: EventId = "g1".into();

        let mut row = sheet_row("0", "Alice", 10.0);
        row.digs = Some(f64::NAN);
        let report = save_stat_rows(&config, "t1", &event, vec![row], &roster);
        assert!(report.is_complete());

        let stored = read_event_rows(&config, "t1", &event).unwrap();
        assert_eq!(stored[0].kills, Some(10.0));
        assert!(stored[0].digs.unwrap().is_nan());

        let game = Event::new(
            "t1".into(),
            EventKind::Game,
            "vs Owls".to_string(),
            NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
        );
        let summary = MatchSummary::from_event(&game, stored);
        let totals = crate::calculate::sum_totals(&[summary]);
        assert!(totals.digs.is_nan());
        assert_eq!(totals.kills, 10.0);
    }

    #[test]
    fn test_reimport_upserts_instead_of_duplicating() {
        let (_tmp, config, roster) = setup();
        let event: EventId = "g1".into();

        save_stat_rows(&config, "t1", &event, vec![sheet_row("0", "Alice", 10.0)], &roster);
        let report =
            save_stat_rows(&config, "t1", &event, vec![sheet_row("5", "alice", 12.0)], &roster);
        assert!(report.is_complete());

        let stored = read_stat_rows(&config, "t1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kills, Some(12.0));
    }

    #[test]
    fn test_update_field_makes_derived_value_authoritative() {
        let (_tmp, config, roster) = setup();
        let event: EventId = "g1".into();
        let report =
            save_stat_rows(&config, "t1", &event, vec![sheet_row("0", "Alice", 10.0)], &roster);
        let id = report.saved[0].clone();

        let row =
            update_stat_field(&config, "t1", &id, StatField::AttackEfficiency, Some(0.33)).unwrap();
        assert_eq!(row.attack_efficiency, Some(0.33));

        let stored = read_stat_rows(&config, "t1").unwrap();
        assert_eq!(stored[0].attack_efficiency, Some(0.33));
        assert_eq!(stored[0].kills, Some(10.0));
    }

    #[test]
    fn test_update_unknown_row() {
        let (_tmp, config, _) = setup();
        let result = update_stat_field(&config, "t1", &"nope".into(), StatField::Kills, None);
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_delete_rows() {
        let (_tmp, config, roster) = setup();
        let event: EventId = "g1".into();
        let mut bo = sheet_row("1", "Bo", 3.0);
        bo.person_id = Some(roster[1].id.clone());
        let report = save_stat_rows(
            &config,
            "t1",
            &event,
            vec![sheet_row("0", "Alice", 10.0), bo],
            &roster,
        );
        assert_eq!(report.saved.len(), 2);

        let removed = delete_stat_rows(&config, "t1", &report.saved[..1]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(read_stat_rows(&config, "t1").unwrap().len(), 1);

        assert_eq!(delete_event_rows(&config, "t1", &event).unwrap(), 1);
        assert!(read_stat_rows(&config, "t1").unwrap().is_empty());
    }

    #[test]
    fn test_load_match_summaries_joins_games_and_rows() {
        let (_tmp, config, roster) = setup();
        let date = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap();
        let game = Event::new("t1".into(), EventKind::Game, "Home".to_string(), date)
            .with_score("3-1".to_string());
        let training = Event::new("t1".into(), EventKind::Training, "Drills".to_string(), date);
        JsonlWriter::for_entity(&config, EntityType::Event, "t1")
            .write_all(&[game.clone(), training])
            .unwrap();

        save_stat_rows(&config, "t1", &game.id, vec![sheet_row("0", "Alice", 9.0)], &roster);

        let summaries = load_match_summaries(&config, "t1").unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].event_id, game.id);
        assert_eq!(summaries[0].rows.len(), 1);
        assert_eq!(summaries[0].score.as_deref(), Some("3-1"));
    }
}
