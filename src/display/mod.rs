//! Column labels and tooltips for stat tables.

use serde::Serialize;

use crate::models::{FieldKind, StatField};

/// Skill group a column is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnGroup {
    Attack,
    Serve,
    Receive,
    Set,
    Dig,
    Block,
    Sets,
}

/// Presentation metadata for one stat column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub id: StatField,
    pub group: ColumnGroup,
    pub label: &'static str,
    pub tooltip: &'static str,
    pub kind: FieldKind,
}

pub fn column(field: StatField) -> ColumnInfo {
    use ColumnGroup::*;

    let (group, label, tooltip) = match field {
        StatField::Kills => (Attack, "K", "Kills"),
        StatField::AttackErrors => (Attack, "E", "Attack errors"),
        StatField::AttackAttempts => (Attack, "TA", "Total attacks"),
        StatField::AttackEfficiency => (
            Attack,
            "Atk%",
            "Attack efficiency: (kills - errors) / total attacks",
        ),
        StatField::KillsPerSet => (Attack, "K/S", "Kills per set"),
        StatField::ServeAces => (Serve, "SA", "Service aces"),
        StatField::ServeErrors => (Serve, "SE", "Service errors"),
        StatField::ServeAttempts => (Serve, "TA", "Total serves"),
        StatField::ServePercentage => (
            Serve,
            "Pct",
            "Serve percentage: serves in play / total serves",
        ),
        StatField::ServeEfficiency => (
            Serve,
            "Eff",
            "Serve efficiency: (aces - errors) / total serves",
        ),
        StatField::ServeRating => (Serve, "Rtg.", "Serve rating"),
        StatField::ReceivePerfect => (Receive, "3", "Perfect passes"),
        StatField::ReceivePositive => (Receive, "2", "Good passes"),
        StatField::ReceiveNegative => (Receive, "1", "Poor passes"),
        StatField::ReceiveError => (Receive, "0", "Reception errors"),
        StatField::ReceiveAttempts => (Receive, "TA", "Total receptions"),
        StatField::ReceivePercentage => (
            Receive,
            "Pass%",
            "Pass rating: weighted 3/2/1/0 average per reception",
        ),
        StatField::SetAssists => (Set, "Ast", "Assists"),
        StatField::SetsTotal => (Set, "TA", "Total set attempts"),
        StatField::SetErrors => (Set, "SE", "Setting errors"),
        StatField::Digs => (Dig, "DS", "Digs"),
        StatField::DigErrors => (Dig, "DE", "Dig errors"),
        StatField::BlockSingle => (Block, "BS", "Solo blocks"),
        StatField::BlockMultiple => (Block, "BA", "Block assists"),
        StatField::BlockErrors => (Block, "BE", "Block errors"),
        StatField::BlocksPerSet => (Block, "B/S", "Blocks per set"),
        StatField::SetsPlayed => (Sets, "Sets", "Sets played"),
    };

    ColumnInfo {
        id: field,
        group,
        label,
        tooltip,
        kind: field.kind(),
    }
}

/// All columns in display order.
pub fn all_columns() -> Vec<ColumnInfo> {
    StatField::ALL.into_iter().map(column).collect()
}
