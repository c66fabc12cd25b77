//! Scheduled team events and attendance.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, EventId, PersonId, Score, TeamId};

/// What kind of event is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A match against an opponent; carries a score and stat rows
    Game,
    #[default]
    Training,
    Other,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Game => write!(f, "game"),
            EventKind::Training => write!(f, "training"),
            EventKind::Other => write!(f, "other"),
        }
    }
}

/// A scheduled team event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub team_id: TeamId,
    pub kind: EventKind,
    pub title: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    /// Opponent name (games only)
    pub opponent: Option<String>,
    /// Final score as `"<team>-<opponent>"` sets, e.g. `"3-1"`
    pub score: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(team_id: TeamId, kind: EventKind, title: String, date: NaiveDate) -> Self {
        Self {
            id: EntityId::random(),
            team_id,
            kind,
            title,
            date,
            location: None,
            opponent: None,
            score: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_opponent(mut self, opponent: String) -> Self {
        self.opponent = Some(opponent);
        self
    }

    pub fn with_score(mut self, score: String) -> Self {
        self.score = Some(score);
        self
    }

    pub fn is_game(&self) -> bool {
        self.kind == EventKind::Game
    }

    /// Parsed score, if one was recorded and is well formed.
    pub fn parsed_score(&self) -> Option<Score> {
        self.score.as_deref().and_then(Score::parse)
    }
}

/// Attendance response to an event invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Accepted,
    #[default]
    Pending,
    Declined,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Accepted => write!(f, "accepted"),
            AttendanceStatus::Pending => write!(f, "pending"),
            AttendanceStatus::Declined => write!(f, "declined"),
        }
    }
}

/// A team member's participation record for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub id: EntityId,
    pub event_id: EventId,
    pub person_id: PersonId,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub updated_at: DateTime<Utc>,
}

impl Attendee {
    /// A fresh invitation. One attendee record exists per (event, person).
    pub fn invite(event_id: EventId, person_id: PersonId) -> Self {
        let id = EntityId::generate(&[event_id.as_str(), person_id.as_str()]);
        Self {
            id,
            event_id,
            person_id,
            status: AttendanceStatus::Pending,
            updated_at: Utc::now(),
        }
    }

    pub fn respond(&mut self, status: AttendanceStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Attendance tallies for an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub accepted: u32,
    pub pending: u32,
    pub declined: u32,
}

impl AttendanceCounts {
    pub fn from_attendees(attendees: &[Attendee]) -> Self {
        let mut counts = Self::default();
        for a in attendees {
            match a.status {
                AttendanceStatus::Accepted => counts.accepted += 1,
                AttendanceStatus::Pending => counts.pending += 1,
                AttendanceStatus::Declined => counts.declined += 1,
            }
        }
        counts
    }
}
