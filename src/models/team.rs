//! Teams, their members and member roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, PersonId, TeamId};

/// A volleyball team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: String) -> Self {
        Self {
            id: EntityId::random(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// A member's role within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Coach,
    #[default]
    Player,
}

impl Role {
    /// Whether this role may create, edit or delete events and statistics.
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Admin | Role::Coach)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Coach => write!(f, "coach"),
            Role::Player => write!(f, "player"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "coach" => Ok(Role::Coach),
            "player" => Ok(Role::Player),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A team member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub team_id: TeamId,
    /// Display name; also the key stat sheets refer to players by
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Jersey number
    #[serde(default)]
    pub number: Option<u32>,
}

impl Person {
    pub fn new(team_id: TeamId, name: String, role: Role) -> Self {
        Self {
            id: EntityId::random(),
            team_id,
            name,
            role,
            number: None,
        }
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_manage());
        assert!(Role::Coach.can_manage());
        assert!(!Role::Player.can_manage());
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Coach".parse::<Role>(), Ok(Role::Coach));
        assert_eq!(" admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("manager".parse::<Role>().is_err());
        assert_eq!(Role::Player.to_string(), "player");
    }

    #[test]
    fn test_person_defaults_to_player_role() {
        let json = r#"{"id":"p1","team_id":"t1","name":"Kim"}"#;
        let person: Person = serde_json::from_str(json).unwrap();
        assert_eq!(person.role, Role::Player);
        assert!(person.number.is_none());
    }

    #[test]
    fn test_person_builder() {
        let person = Person::new("t1".into(), "Kim".to_string(), Role::Coach).with_number(7);
        assert_eq!(person.number, Some(7));
        assert_eq!(person.team_id.as_str(), "t1");
    }
}
