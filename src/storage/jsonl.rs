//! JSONL (JSON Lines) storage.
//!
//! Each line is a valid JSON object representing one entity. Updates
//! rewrite the whole file; files are small (one team's season).

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::Team;

/// Per-team entity files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Person,
    Event,
    Attendee,
    StatRow,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Person => "persons.jsonl",
            EntityType::Event => "events.jsonl",
            EntityType::Attendee => "attendees.jsonl",
            EntityType::StatRow => "stat_rows.jsonl",
        }
    }
}

/// Get the path of a team's entity file.
pub fn entity_path(config: &StorageConfig, entity: EntityType, team_id: &str) -> PathBuf {
    config.team_dir(team_id).join(entity.filename())
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for one of a team's entity files.
    pub fn for_entity(config: &StorageConfig, entity: EntityType, team_id: &str) -> Self {
        Self::new(entity_path(config, entity, team_id))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single entity to the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended entity to {:?}", self.path);
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        info!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for one of a team's entity files.
    pub fn for_entity(config: &StorageConfig, entity: EntityType, team_id: &str) -> Self {
        Self::new(entity_path(config, entity, team_id))
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file. Unparseable lines are skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", i + 1, self.path, e);
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }

    /// Count entities in the file.
    pub fn count(&self) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }
}

/// Insert `entity`, replacing any existing entity with the same key.
///
/// Returns `true` when the entity was new.
pub fn upsert_by<T, K, F>(path: &Path, entity: T, key: F) -> Result<bool, StorageError>
where
    T: Serialize + DeserializeOwned,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut entities = JsonlReader::<T>::new(path.to_path_buf()).read_all()?;
    let wanted = key(&entity);

    let inserted = match entities.iter_mut().find(|e| key(&**e) == wanted) {
        Some(existing) => {
            *existing = entity;
            false
        }
        None => {
            entities.push(entity);
            true
        }
    };

    JsonlWriter::new(path.to_path_buf()).write_all(&entities)?;
    Ok(inserted)
}

/// Drop every entity matching `predicate`. Returns how many were removed.
pub fn remove_where<T, F>(path: &Path, predicate: F) -> Result<usize, StorageError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let reader = JsonlReader::<T>::new(path.to_path_buf());
    if !reader.exists() {
        return Ok(0);
    }
    let entities = reader.read_all()?;
    let before = entities.len();
    let kept: Vec<T> = entities.into_iter().filter(|e| !predicate(e)).collect();
    let removed = before - kept.len();

    if removed > 0 {
        JsonlWriter::new(path.to_path_buf()).write_all(&kept)?;
    }
    Ok(removed)
}

/// Read all teams from the global file.
pub fn read_teams(config: &StorageConfig) -> Result<Vec<Team>, StorageError> {
    JsonlReader::new(config.teams_path()).read_all()
}

/// Find one team by ID.
pub fn find_team(config: &StorageConfig, team_id: &str) -> Result<Team, StorageError> {
    read_teams(config)?
        .into_iter()
        .find(|t| t.id.as_str() == team_id)
        .ok_or_else(|| StorageError::NotFound(format!("team {}", team_id)))
}

/// Add a team to the global file and create its directory.
pub fn create_team(config: &StorageConfig, team: &Team) -> Result<(), StorageError> {
    JsonlWriter::new(config.teams_path()).append(team)?;
    fs::create_dir_all(config.team_dir(team.id.as_str()))?;
    info!("Created team {} ({})", team.name, team.id);
    Ok(())
}
