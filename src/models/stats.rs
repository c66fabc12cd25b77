//! Derived team statistics models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, PersonId, StatField, StatRow};

/// Inclusive date range for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// The `days`-long window ending on `to`.
    pub fn trailing_days(to: NaiveDate, days: u32) -> Self {
        let from = to - chrono::Duration::days(i64::from(days));
        Self { from, to }
    }

    /// Fill whichever bound is missing: `to` defaults to `today`, `from` to
    /// `default_days` before `to`.
    pub fn from_bounds(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
        default_days: u32,
    ) -> Self {
        let to = to.unwrap_or(today);
        match from {
            Some(from) => Self { from, to },
            None => Self::trailing_days(to, default_days),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// Summed counters across a set of stat rows.
///
/// Only counter fields are summed; absent values count as zero and a
/// `NaN` cell makes its total `NaN`. Derived fields (efficiencies,
/// percentages, per-set rates) and `serve_rating` are not carried here:
/// team-level rates live on [`TeamAggregate`], recomputed from these sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatTotals {
    pub kills: f64,
    pub attack_errors: f64,
    pub attack_attempts: f64,
    pub serve_aces: f64,
    pub serve_errors: f64,
    pub serve_attempts: f64,
    pub receive_perfect: f64,
    pub receive_positive: f64,
    pub receive_negative: f64,
    pub receive_error: f64,
    pub receive_attempts: f64,
    pub set_assists: f64,
    pub sets_total: f64,
    pub set_errors: f64,
    pub digs: f64,
    pub dig_errors: f64,
    pub block_single: f64,
    pub block_multiple: f64,
    pub block_errors: f64,
    pub sets_played: f64,
}

impl StatTotals {
    /// Add every counter of `row` into these totals.
    pub fn add_row(&mut self, row: &StatRow) {
        for field in StatField::counters() {
            if let (Some(slot), Some(value)) = (self.slot_mut(field), row.get(field)) {
                *slot += value;
            }
        }
    }

    /// Read a summed counter. `None` for derived and rating fields.
    pub fn get(&self, field: StatField) -> Option<f64> {
        let value = match field {
            StatField::Kills => self.kills,
            StatField::AttackErrors => self.attack_errors,
            StatField::AttackAttempts => self.attack_attempts,
            StatField::ServeAces => self.serve_aces,
            StatField::ServeErrors => self.serve_errors,
            StatField::ServeAttempts => self.serve_attempts,
            StatField::ReceivePerfect => self.receive_perfect,
            StatField::ReceivePositive => self.receive_positive,
            StatField::ReceiveNegative => self.receive_negative,
            StatField::ReceiveError => self.receive_error,
            StatField::ReceiveAttempts => self.receive_attempts,
            StatField::SetAssists => self.set_assists,
            StatField::SetsTotal => self.sets_total,
            StatField::SetErrors => self.set_errors,
            StatField::Digs => self.digs,
            StatField::DigErrors => self.dig_errors,
            StatField::BlockSingle => self.block_single,
            StatField::BlockMultiple => self.block_multiple,
            StatField::BlockErrors => self.block_errors,
            StatField::SetsPlayed => self.sets_played,
            _ => return None,
        };
        Some(value)
    }

    fn slot_mut(&mut self, field: StatField) -> Option<&mut f64> {
        let slot = match field {
            StatField::Kills => &mut self.kills,
            StatField::AttackErrors => &mut self.attack_errors,
            StatField::AttackAttempts => &mut self.attack_attempts,
            StatField::ServeAces => &mut self.serve_aces,
            StatField::ServeErrors => &mut self.serve_errors,
            StatField::ServeAttempts => &mut self.serve_attempts,
            StatField::ReceivePerfect => &mut self.receive_perfect,
            StatField::ReceivePositive => &mut self.receive_positive,
            StatField::ReceiveNegative => &mut self.receive_negative,
            StatField::ReceiveError => &mut self.receive_error,
            StatField::ReceiveAttempts => &mut self.receive_attempts,
            StatField::SetAssists => &mut self.set_assists,
            StatField::SetsTotal => &mut self.sets_total,
            StatField::SetErrors => &mut self.set_errors,
            StatField::Digs => &mut self.digs,
            StatField::DigErrors => &mut self.dig_errors,
            StatField::BlockSingle => &mut self.block_single,
            StatField::BlockMultiple => &mut self.block_multiple,
            StatField::BlockErrors => &mut self.block_errors,
            StatField::SetsPlayed => &mut self.sets_played,
            _ => return None,
        };
        Some(slot)
    }
}

/// One point of the per-match chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPoint {
    pub event_id: EventId,
    pub date: NaiveDate,
    pub title: String,
    /// Kills + blocks + aces
    pub score: f64,
    /// Attack, serve, receive, set, dig and block errors
    pub errors: f64,
}

/// Team-level aggregate over a set of matches. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub computed_at: DateTime<Utc>,

    /// Range the matches were filtered to, if any
    pub date_range: Option<DateRange>,

    /// Matches considered (scored or not)
    pub matches: u32,

    pub wins: u32,
    pub losses: u32,

    /// Ceiling-rounded to 2 decimals; `None` without scored matches
    pub win_percentage: Option<f64>,

    pub totals: StatTotals,

    pub attack_efficiency: Option<f64>,
    pub kills_per_set: Option<f64>,
    pub serve_percentage: Option<f64>,
    pub serve_efficiency: Option<f64>,
    pub receive_percentage: Option<f64>,
    pub blocks_per_set: Option<f64>,

    /// Chronological per-match score/error series
    pub series: Vec<MatchPoint>,
}

/// A player's summed line for leaderboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub person_id: Option<PersonId>,
    pub name: String,
    pub matches: u32,
    pub value: f64,
    pub totals: StatTotals,
}
