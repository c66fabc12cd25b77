use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::routes::events::{load_event, read_attendees};
use crate::api::routes::teams::load_roster;
use crate::api::state::AppState;
use crate::api::{require_manager, ApiError};
use crate::models::{AttendanceCounts, AttendanceStatus, Attendee, PersonId};
use crate::storage::{entity_path, upsert_by, EntityType};

#[derive(Debug, Serialize)]
pub struct AttendeeEntry {
    pub person_id: PersonId,
    pub name: String,
    pub status: AttendanceStatus,
    /// When the member last responded; `None` while never answered
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub attendees: Vec<AttendeeEntry>,
    pub counts: AttendanceCounts,
}

#[derive(Debug, Deserialize)]
pub struct SetAttendanceRequest {
    pub person_id: PersonId,
    pub status: AttendanceStatus,
}

/// Every roster member's status for an event. Members who never
/// responded are listed as pending.
pub async fn list_attendees(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let event = load_event(&state, &team_id, &event_id)?;
    let roster = load_roster(&state, &team_id)?;
    let stored: Vec<Attendee> = read_attendees(&state, &team_id)?
        .into_iter()
        .filter(|a| a.event_id == event.id)
        .collect();

    let mut records = Vec::with_capacity(roster.len());
    let mut attendees = Vec::with_capacity(roster.len());
    for person in &roster {
        let record = stored
            .iter()
            .find(|a| a.person_id == person.id)
            .cloned()
            .unwrap_or_else(|| Attendee::invite(event.id.clone(), person.id.clone()));

        attendees.push(AttendeeEntry {
            person_id: person.id.clone(),
            name: person.name.clone(),
            status: record.status,
            updated_at: stored
                .iter()
                .any(|a| a.id == record.id)
                .then_some(record.updated_at),
        });
        records.push(record);
    }
    attendees.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Json(AttendanceResponse {
        counts: AttendanceCounts::from_attendees(&records),
        attendees,
    }))
}

pub async fn set_attendance(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<SetAttendanceRequest>,
) -> Result<Json<Attendee>, ApiError> {
    require_manager(&headers)?;
    let event = load_event(&state, &team_id, &event_id)?;

    let roster = load_roster(&state, &team_id)?;
    if !roster.iter().any(|p| p.id == req.person_id) {
        return Err(ApiError::NotFound(format!("person {}", req.person_id)));
    }

    let _guard = state.write_lock.lock().await;
    let mut attendee = read_attendees(&state, &team_id)?
        .into_iter()
        .find(|a| a.event_id == event.id && a.person_id == req.person_id)
        .unwrap_or_else(|| Attendee::invite(event.id.clone(), req.person_id.clone()));
    attendee.respond(req.status);

    let path = entity_path(&state.storage, EntityType::Attendee, &team_id);
    upsert_by(&path, attendee.clone(), |a: &Attendee| a.id.clone())?;
    tracing::info!(
        "{} is {} for event {}",
        attendee.person_id,
        attendee.status,
        event.id
    );

    Ok(Json(attendee))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{get_json, send_json, setup_team};
    use crate::models::{Event, EventKind, Person, Role};
    use crate::storage::{EntityType, JsonlWriter};
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use serde_json::json;

    #[tokio::test]
    async fn test_attendance_defaults_to_pending_then_updates() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let team_id = team.id.to_string();

        let anna = Person::new(team.id.clone(), "Anna".to_string(), Role::Player);
        let ben = Person::new(team.id.clone(), "Ben".to_string(), Role::Player);
        JsonlWriter::for_entity(&state.storage, EntityType::Person, &team_id)
            .write_all(&[anna.clone(), ben])
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
        let event = Event::new(team.id.clone(), EventKind::Training, "Drills".to_string(), date);
        JsonlWriter::for_entity(&state.storage, EntityType::Event, &team_id)
            .append(&event)
            .unwrap();

        let uri = format!("/api/teams/{}/events/{}/attendees", team_id, event.id);
        let (status, json) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["counts"]["pending"], 2);
        assert_eq!(json["attendees"][0]["status"], "pending");
        assert!(json["attendees"][0]["updated_at"].is_null());

        let body = json!({"person_id": anna.id.as_str(), "status": "accepted"});
        let (status, json) = send_json(&state, "PUT", &uri, "coach", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "accepted");

        // Responding twice keeps one record
        send_json(&state, "PUT", &uri, "coach", body).await;

        let (_, json) = get_json(&state, &uri).await;
        assert_eq!(json["counts"]["accepted"], 1);
        assert_eq!(json["counts"]["pending"], 1);
        assert_eq!(json["attendees"][0]["name"], "Anna");
        assert!(!json["attendees"][0]["updated_at"].is_null());
    }

    #[tokio::test]
    async fn test_attendance_rejects_player_and_unknown_person() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, team) = setup_team(tmp.path());
        let team_id = team.id.to_string();
        let date = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
        let event = Event::new(team.id.clone(), EventKind::Other, "Party".to_string(), date);
        JsonlWriter::for_entity(&state.storage, EntityType::Event, &team_id)
            .append(&event)
            .unwrap();

        let uri = format!("/api/teams/{}/events/{}/attendees", team_id, event.id);
        let body = json!({"person_id": "ghost", "status": "declined"});

        let (status, _) = send_json(&state, "PUT", &uri, "player", body.clone()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send_json(&state, "PUT", &uri, "admin", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
