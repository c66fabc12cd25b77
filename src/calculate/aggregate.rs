//! Team-level aggregation over matches.

use std::collections::BTreeMap;

use chrono::Utc;

use super::{efficiency, pass_rating, ratio, round2, to_percentage, win_percentage};
use crate::models::{
    DateRange, FieldKind, LeaderboardEntry, MatchPoint, MatchSummary, StatField, StatRow,
    StatTotals, TeamAggregate,
};

/// Win/loss record over matches with a parseable score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

impl Record {
    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Tally wins and losses. Matches without a score are skipped, not lost.
pub fn tally_record(matches: &[MatchSummary]) -> Record {
    let mut record = Record::default();
    for score in matches.iter().filter_map(MatchSummary::parsed_score) {
        if score.is_win() {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
    }
    record
}

/// Sum every counter across all rows of all matches.
pub fn sum_totals(matches: &[MatchSummary]) -> StatTotals {
    let mut totals = StatTotals::default();
    for row in matches.iter().flat_map(|m| m.rows.iter()) {
        totals.add_row(row);
    }
    totals
}

/// Evaluate a derived metric over summed totals.
///
/// Same arithmetic as the per-row formulas, without the stored-value
/// preference; only a zero denominator yields `None`.
pub fn totals_metric(totals: &StatTotals, field: StatField) -> Option<f64> {
    match field.kind() {
        FieldKind::Counter => totals.get(field),
        FieldKind::Rating => None,
        FieldKind::Derived => match field {
            StatField::AttackEfficiency => efficiency(
                totals.kills,
                totals.attack_errors,
                totals.attack_attempts,
            ),
            StatField::KillsPerSet => ratio(totals.kills, totals.sets_played).map(round2),
            StatField::ServePercentage => ratio(
                totals.serve_attempts - totals.serve_errors,
                totals.serve_attempts,
            )
            .map(to_percentage),
            StatField::ServeEfficiency => efficiency(
                totals.serve_aces,
                totals.serve_errors,
                totals.serve_attempts,
            ),
            StatField::ReceivePercentage => pass_rating(
                totals.receive_perfect,
                totals.receive_positive,
                totals.receive_negative,
                totals.receive_attempts,
            ),
            StatField::BlocksPerSet => ratio(
                totals.block_single + totals.block_multiple,
                totals.sets_played,
            )
            .map(round2),
            _ => None,
        },
    }
}

fn value(v: Option<f64>) -> f64 {
    v.unwrap_or(0.0)
}

/// Points a player produced directly: kills, blocks and aces.
pub fn row_points(row: &StatRow) -> f64 {
    value(row.kills) + value(row.block_single) + value(row.block_multiple) + value(row.serve_aces)
}

/// Every error type a player can commit.
pub fn row_errors(row: &StatRow) -> f64 {
    value(row.attack_errors)
        + value(row.serve_errors)
        + value(row.receive_error)
        + value(row.set_errors)
        + value(row.dig_errors)
        + value(row.block_errors)
}

/// Per-match points/errors series, ordered by date.
pub fn match_series(matches: &[MatchSummary]) -> Vec<MatchPoint> {
    let mut series: Vec<MatchPoint> = matches
        .iter()
        .map(|m| MatchPoint {
            event_id: m.event_id.clone(),
            date: m.date,
            title: m.title.clone(),
            score: m.rows.iter().map(row_points).sum(),
            errors: m.rows.iter().map(row_errors).sum(),
        })
        .collect();
    series.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.event_id.cmp(&b.event_id)));
    series
}

/// Keep the matches played within `range`.
pub fn filter_by_date(matches: &[MatchSummary], range: &DateRange) -> Vec<MatchSummary> {
    matches
        .iter()
        .filter(|m| range.contains(m.date))
        .cloned()
        .collect()
}

/// Aggregate a set of matches into team totals and summaries.
pub fn aggregate(matches: &[MatchSummary]) -> TeamAggregate {
    let record = tally_record(matches);
    let totals = sum_totals(matches);

    TeamAggregate {
        computed_at: Utc::now(),
        date_range: None,
        matches: matches.len() as u32,
        wins: record.wins,
        losses: record.losses,
        win_percentage: win_percentage(record.wins, record.total()),
        attack_efficiency: totals_metric(&totals, StatField::AttackEfficiency),
        kills_per_set: totals_metric(&totals, StatField::KillsPerSet),
        serve_percentage: totals_metric(&totals, StatField::ServePercentage),
        serve_efficiency: totals_metric(&totals, StatField::ServeEfficiency),
        receive_percentage: totals_metric(&totals, StatField::ReceivePercentage),
        blocks_per_set: totals_metric(&totals, StatField::BlocksPerSet),
        series: match_series(matches),
        totals,
    }
}

/// Aggregate only the matches within `range`.
pub fn aggregate_range(matches: &[MatchSummary], range: DateRange) -> TeamAggregate {
    let filtered = filter_by_date(matches, &range);
    let mut result = aggregate(&filtered);
    result.date_range = Some(range);
    result
}

/// Per-player totals ranked by `field`, highest first.
///
/// Rows are grouped by person id, or by name for rows never linked to a
/// roster member. Players with no value for `field` are left out.
pub fn leaderboard(
    matches: &[MatchSummary],
    field: StatField,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut players: BTreeMap<String, LeaderboardEntry> = BTreeMap::new();

    for m in matches {
        for row in &m.rows {
            let key = match &row.person_id {
                Some(id) => format!("id:{}", id),
                None => format!("name:{}", row.name.trim()),
            };
            let entry = players.entry(key).or_insert_with(|| LeaderboardEntry {
                person_id: row.person_id.clone(),
                name: row.name.trim().to_string(),
                matches: 0,
                value: 0.0,
                totals: StatTotals::default(),
            });
            entry.matches += 1;
            entry.totals.add_row(row);
        }
    }

    let mut ranked: Vec<LeaderboardEntry> = players
        .into_values()
        .filter_map(|mut entry| {
            entry.value = totals_metric(&entry.totals, field)?;
            Some(entry)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}
