use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::routes::teams::load_team;
use crate::api::state::AppState;
use crate::api::{
    dedup_by_id, parse_date_param, require_manager, ApiError, Pagination, PaginationMeta,
};
use crate::models::{AttendanceCounts, Attendee, Event, EventKind};
use crate::storage::{
    delete_event_rows, entity_path, read_event_rows, remove_where, upsert_by, EntityType,
    JsonlReader,
};

#[derive(Debug, Deserialize)]
pub struct ListEventsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub kind: Option<EventKind>,
}

#[derive(Debug, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub attendance: AttendanceCounts,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventSummary>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub kind: EventKind,
    pub title: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub opponent: Option<String>,
    pub score: Option<String>,
}

/// Fields left out keep their current value. For the optional text
/// fields, an explicit `null` (or an empty string) clears the value, so a
/// game can go back to "not played".
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_clearable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_clearable")]
    pub opponent: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_clearable")]
    pub score: Option<Option<String>>,
}

/// Present key → `Some`; `null` or blank text → `Some(None)`.
fn deserialize_clearable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(value.filter(|s| !s.trim().is_empty())))
}

#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: Event,
    pub attendance: AttendanceCounts,
    pub stat_rows: usize,
    /// `"win"` or `"loss"` for games with a readable score
    pub result: Option<&'static str>,
}

pub(crate) fn read_events(state: &AppState, team_id: &str) -> Result<Vec<Event>, ApiError> {
    let events =
        JsonlReader::<Event>::for_entity(&state.storage, EntityType::Event, team_id).read_all()?;
    Ok(dedup_by_id(events, |e| e.id.as_str()))
}

/// The event behind an `:event` path segment, or 404.
///
/// The team is looked up first so an unknown `:team` never reaches the
/// filesystem.
pub(crate) fn load_event(state: &AppState, team_id: &str, event_id: &str) -> Result<Event, ApiError> {
    load_team(state, team_id)?;
    read_events(state, team_id)?
        .into_iter()
        .find(|e| e.id.as_str() == event_id)
        .ok_or_else(|| ApiError::NotFound(format!("event {}", event_id)))
}

pub(crate) fn read_attendees(state: &AppState, team_id: &str) -> Result<Vec<Attendee>, ApiError> {
    Ok(
        JsonlReader::<Attendee>::for_entity(&state.storage, EntityType::Attendee, team_id)
            .read_all()?,
    )
}

fn attendance_for(attendees: &[Attendee], event: &Event) -> AttendanceCounts {
    let own: Vec<Attendee> = attendees
        .iter()
        .filter(|a| a.event_id == event.id)
        .cloned()
        .collect();
    AttendanceCounts::from_attendees(&own)
}

pub async fn list_events(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Query(params): Query<ListEventsParams>,
) -> Result<Json<EventListResponse>, ApiError> {
    load_team(&state, &team_id)?;
    let from = parse_date_param(params.from.as_deref(), "from")?;
    let to = parse_date_param(params.to.as_deref(), "to")?;

    let mut events = read_events(&state, &team_id)?;
    if let Some(from) = from {
        events.retain(|e| e.date >= from);
    }
    if let Some(to) = to {
        events.retain(|e| e.date <= to);
    }
    if let Some(kind) = params.kind {
        events.retain(|e| e.kind == kind);
    }

    // Most recent first
    events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));

    let attendees = read_attendees(&state, &team_id)?;
    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, events.len() as u32);

    let summaries = pagination
        .slice(&events)
        .iter()
        .map(|event| EventSummary {
            attendance: attendance_for(&attendees, event),
            event: event.clone(),
        })
        .collect();

    Ok(Json(EventListResponse {
        events: summaries,
        pagination: meta,
    }))
}

pub async fn create_event(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    require_manager(&headers)?;
    let team = load_team(&state, &team_id)?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Event title must not be empty".to_string()));
    }

    let mut event = Event::new(team.id, req.kind, title.to_string(), req.date);
    event.location = req.location;
    event.opponent = req.opponent;
    event.score = req.score;

    let _guard = state.write_lock.lock().await;
    let path = entity_path(&state.storage, EntityType::Event, &team_id);
    upsert_by(&path, event.clone(), |e: &Event| e.id.clone())?;
    tracing::info!("Created {} event {} for team {}", event.kind, event.id, team_id);

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
) -> Result<Json<EventDetailResponse>, ApiError> {
    let event = load_event(&state, &team_id, &event_id)?;
    let attendees = read_attendees(&state, &team_id)?;
    let stat_rows = read_event_rows(&state.storage, &team_id, &event.id)?.len();

    let result = if event.is_game() {
        event
            .parsed_score()
            .map(|s| if s.is_win() { "win" } else { "loss" })
    } else {
        None
    };

    Ok(Json(EventDetailResponse {
        attendance: attendance_for(&attendees, &event),
        stat_rows,
        result,
        event,
    }))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    require_manager(&headers)?;

    let _guard = state.write_lock.lock().await;
    let mut event = load_event(&state, &team_id, &event_id)?;

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Event title must not be empty".to_string()));
        }
        event.title = title.trim().to_string();
    }
    if let Some(date) = req.date {
        event.date = date;
    }
    if let Some(location) = req.location {
        event.location = location;
    }
    if let Some(opponent) = req.opponent {
        event.opponent = opponent;
    }
    if let Some(score) = req.score {
        event.score = score;
    }

    let path = entity_path(&state.storage, EntityType::Event, &team_id);
    upsert_by(&path, event.clone(), |e: &Event| e.id.clone())?;
    Ok(Json(event))
}

/// Delete an event together with its attendance and stat rows.
pub async fn delete_event(
    State(state): State<AppState>,
    Path((team_id, event_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_manager(&headers)?;

    let _guard = state.write_lock.lock().await;
    let event = load_event(&state, &team_id, &event_id)?;

    let storage = &state.storage;
    remove_where(
        &entity_path(storage, EntityType::Event, &team_id),
        |e: &Event| e.id == event.id,
    )?;
    remove_where(
        &entity_path(storage, EntityType::Attendee, &team_id),
        |a: &Attendee| a.event_id == event.id,
    )?;
    let rows = delete_event_rows(storage, &team_id, &event.id)?;

    tracing::info!("Deleted event {} and {} stat rows", event.id, rows);
    Ok(StatusCode::NO_CONTENT)
}
