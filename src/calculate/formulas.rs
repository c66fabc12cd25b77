//! Single-row derived statistics.
//!
//! Each formula prefers the value already stored on the row. It only
//! computes when nothing is stored and every input it needs is usable.
//!
//! "Usable" is governed by [`InputPolicy`]. Under the default
//! [`InputPolicy::ZeroAsMissing`] an input of exactly `0` counts as
//! missing, so a player with 10 kills, 0 errors and 20 attempts gets no
//! attack efficiency. Existing stat sheets were recorded under that rule,
//! so it stays the default; [`InputPolicy::ZeroAsValue`] is available to
//! callers that want zeros to count.

use serde::{Deserialize, Serialize};

use super::{efficiency, pass_rating, ratio, round2, to_percentage};
use crate::models::{StatField, StatRow};

/// Which input values a formula accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Absent, zero and NaN inputs are all treated as missing.
    #[default]
    ZeroAsMissing,
    /// Only absent and NaN inputs are missing.
    ZeroAsValue,
}

impl InputPolicy {
    fn accept(self, value: Option<f64>) -> Option<f64> {
        match self {
            InputPolicy::ZeroAsMissing => value.filter(|v| *v != 0.0 && !v.is_nan()),
            InputPolicy::ZeroAsValue => value.filter(|v| !v.is_nan()),
        }
    }
}

/// Return `stored` if present, otherwise the computed value if it is finite.
fn prefer_stored(stored: Option<f64>, compute: impl FnOnce() -> Option<f64>) -> Option<f64> {
    if stored.is_some() {
        return stored;
    }
    compute().filter(|v| v.is_finite())
}

/// `(kills - attack_errors) / attack_attempts`
pub fn attack_efficiency(row: &StatRow, policy: InputPolicy) -> Option<f64> {
    prefer_stored(row.attack_efficiency, || {
        let kills = policy.accept(row.kills)?;
        let errors = policy.accept(row.attack_errors)?;
        let attempts = policy.accept(row.attack_attempts)?;
        efficiency(kills, errors, attempts)
    })
}

/// `kills / sets_played`
pub fn kills_per_set(row: &StatRow, policy: InputPolicy) -> Option<f64> {
    prefer_stored(row.kills_per_set, || {
        let kills = policy.accept(row.kills)?;
        let sets = policy.accept(row.sets_played)?;
        ratio(kills, sets).map(round2)
    })
}

/// `(serve_attempts - serve_errors) / serve_attempts` as a whole percentage.
pub fn serve_percentage(row: &StatRow, policy: InputPolicy) -> Option<f64> {
    prefer_stored(row.serve_percentage, || {
        let attempts = policy.accept(row.serve_attempts)?;
        let errors = policy.accept(row.serve_errors)?;
        ratio(attempts - errors, attempts).map(to_percentage)
    })
}

/// `(serve_aces - serve_errors) / serve_attempts`
pub fn serve_efficiency(row: &StatRow, policy: InputPolicy) -> Option<f64> {
    prefer_stored(row.serve_efficiency, || {
        let aces = policy.accept(row.serve_aces)?;
        let errors = policy.accept(row.serve_errors)?;
        let attempts = policy.accept(row.serve_attempts)?;
        efficiency(aces, errors, attempts)
    })
}

/// Weighted pass rating over receive attempts.
pub fn receive_percentage(row: &StatRow, policy: InputPolicy) -> Option<f64> {
    prefer_stored(row.receive_percentage, || {
        let perfect = policy.accept(row.receive_perfect)?;
        let positive = policy.accept(row.receive_positive)?;
        let negative = policy.accept(row.receive_negative)?;
        let attempts = policy.accept(row.receive_attempts)?;
        pass_rating(perfect, positive, negative, attempts)
    })
}

/// `(block_single + block_multiple) / sets_played`
pub fn blocks_per_set(row: &StatRow, policy: InputPolicy) -> Option<f64> {
    prefer_stored(row.blocks_per_set, || {
        let single = policy.accept(row.block_single)?;
        let multiple = policy.accept(row.block_multiple)?;
        let sets = policy.accept(row.sets_played)?;
        ratio(single + multiple, sets).map(round2)
    })
}

/// Evaluate the formula behind a derived field. `None` for other fields.
pub fn derived_value(row: &StatRow, field: StatField, policy: InputPolicy) -> Option<f64> {
    match field {
        StatField::AttackEfficiency => attack_efficiency(row, policy),
        StatField::KillsPerSet => kills_per_set(row, policy),
        StatField::ServePercentage => serve_percentage(row, policy),
        StatField::ServeEfficiency => serve_efficiency(row, policy),
        StatField::ReceivePercentage => receive_percentage(row, policy),
        StatField::BlocksPerSet => blocks_per_set(row, policy),
        _ => None,
    }
}

/// A copy of `row` with every absent derived field filled in where possible.
/// Present fields are never overwritten.
pub fn derive_row(row: &StatRow, policy: InputPolicy) -> StatRow {
    let mut derived = row.clone();
    derived.attack_efficiency = attack_efficiency(row, policy);
    derived.kills_per_set = kills_per_set(row, policy);
    derived.serve_percentage = serve_percentage(row, policy);
    derived.serve_efficiency = serve_efficiency(row, policy);
    derived.receive_percentage = receive_percentage(row, policy);
    derived.blocks_per_set = blocks_per_set(row, policy);
    derived
}

pub fn derive_rows(rows: &[StatRow], policy: InputPolicy) -> Vec<StatRow> {
    rows.iter().map(|r| derive_row(r, policy)).collect()
}
