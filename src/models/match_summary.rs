//! A played match with its stat lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Event, EventId, StatRow};

/// A parsed final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub team: i32,
    pub opponent: i32,
}

impl Score {
    /// Parse `"<team>-<opponent>"`. Anything after a second dash is ignored.
    /// Returns `None` for blank input or non-integer sides.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let mut parts = s.split('-');
        let team = parts.next()?.trim().parse().ok()?;
        let opponent = parts.next()?.trim().parse().ok()?;
        Some(Self { team, opponent })
    }

    /// A tie is not a win.
    pub fn is_win(&self) -> bool {
        self.team > self.opponent
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.team, self.opponent)
    }
}

/// One match's metadata plus its stat rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub event_id: EventId,
    pub title: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub opponent: Option<String>,
    /// Raw score string as recorded
    pub score: Option<String>,
    pub rows: Vec<StatRow>,
}

impl MatchSummary {
    pub fn from_event(event: &Event, rows: Vec<StatRow>) -> Self {
        Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            date: event.date,
            location: event.location.clone(),
            opponent: event.opponent.clone(),
            score: event.score.clone(),
            rows,
        }
    }

    pub fn parsed_score(&self) -> Option<Score> {
        self.score.as_deref().and_then(Score::parse)
    }

    pub fn team_score(&self) -> Option<i32> {
        self.parsed_score().map(|s| s.team)
    }

    pub fn opponent_score(&self) -> Option<i32> {
        self.parsed_score().map(|s| s.opponent)
    }
}
