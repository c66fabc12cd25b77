use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{dedup_by_id, require_manager, ApiError};
use crate::models::{Person, Role, Team};
use crate::storage::{self, EntityType, JsonlReader, JsonlWriter};

#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PersonListResponse {
    pub persons: Vec<Person>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonRequest {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub number: Option<u32>,
}

/// The team behind a `:team` path segment, or 404.
pub fn load_team(state: &AppState, team_id: &str) -> Result<Team, ApiError> {
    Ok(storage::find_team(&state.storage, team_id)?)
}

/// Current roster of a team.
pub fn load_roster(state: &AppState, team_id: &str) -> Result<Vec<Person>, ApiError> {
    let persons = JsonlReader::<Person>::for_entity(&state.storage, EntityType::Person, team_id)
        .read_all()?;
    Ok(dedup_by_id(persons, |p| p.id.as_str()))
}

pub async fn list_teams(State(state): State<AppState>) -> Result<Json<TeamListResponse>, ApiError> {
    let mut teams = dedup_by_id(storage::read_teams(&state.storage)?, |t| t.id.as_str());
    teams.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(TeamListResponse { teams }))
}

pub async fn create_team(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    require_manager(&headers)?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Team name must not be empty".to_string()));
    }

    let team = Team::new(name.to_string());
    let _guard = state.write_lock.lock().await;
    storage::create_team(&state.storage, &team)?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn list_persons(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<PersonListResponse>, ApiError> {
    load_team(&state, &team_id)?;
    let mut persons = load_roster(&state, &team_id)?;
    persons.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(Json(PersonListResponse { persons }))
}

pub async fn create_person(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    require_manager(&headers)?;
    let team = load_team(&state, &team_id)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Person name must not be empty".to_string()));
    }

    let mut person = Person::new(team.id, name.to_string(), req.role);
    person.number = req.number;

    let _guard = state.write_lock.lock().await;
    JsonlWriter::for_entity(&state.storage, EntityType::Person, &team_id).append(&person)?;
    tracing::info!("Added {} to team {}", person.name, team_id);
    Ok((StatusCode::CREATED, Json(person)))
}
