//! Matching stat sheet names to team members.

use thiserror::Error;

use crate::models::{Person, StatRow};

/// A stat row whose player could not be pinned to exactly one member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Multiple persons found: {0}")]
    MultiplePersonsFound(String),
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Find the single roster member called `name` (trimmed, case-insensitive).
pub fn resolve_person<'a>(name: &str, roster: &'a [Person]) -> Result<&'a Person, RosterError> {
    let mut matches = roster.iter().filter(|p| same_name(&p.name, name));

    match (matches.next(), matches.next()) {
        (Some(person), None) => Ok(person),
        (None, _) => Err(RosterError::PersonNotFound(name.trim().to_string())),
        (Some(_), Some(_)) => Err(RosterError::MultiplePersonsFound(name.trim().to_string())),
    }
}

/// Attach a person ID to `row` unless it already has one.
pub fn link_row(row: &mut StatRow, roster: &[Person]) -> Result<(), RosterError> {
    if row.person_id.is_some() {
        return Ok(());
    }
    let person = resolve_person(&row.name, roster)?;
    row.person_id = Some(person.id.clone());
    Ok(())
}
