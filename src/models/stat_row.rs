//! Per-player match statistics.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{EntityId, EventId, PersonId, StatRowId};

/// One player's counters for one match.
///
/// Every numeric field is optional: a blank spreadsheet cell or an
/// untracked skill is `None`, never zero. Derived fields (efficiencies,
/// per-set rates) may be stored; a stored value wins over recomputation.
/// Malformed cells are kept as `NaN` and survive a save (see [`stat_value`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatRow {
    pub id: StatRowId,
    pub name: String,
    pub person_id: Option<PersonId>,
    /// The game this line belongs to. Unset for freshly imported rows.
    pub event_id: Option<EventId>,

    // Attack
    #[serde(with = "stat_value")]
    pub kills: Option<f64>,
    #[serde(with = "stat_value")]
    pub attack_errors: Option<f64>,
    #[serde(with = "stat_value")]
    pub attack_attempts: Option<f64>,
    #[serde(with = "stat_value")]
    pub attack_efficiency: Option<f64>,
    #[serde(with = "stat_value")]
    pub kills_per_set: Option<f64>,

    // Serve
    #[serde(with = "stat_value")]
    pub serve_aces: Option<f64>,
    #[serde(with = "stat_value")]
    pub serve_errors: Option<f64>,
    #[serde(with = "stat_value")]
    pub serve_attempts: Option<f64>,
    #[serde(with = "stat_value")]
    pub serve_percentage: Option<f64>,
    #[serde(with = "stat_value")]
    pub serve_efficiency: Option<f64>,
    #[serde(with = "stat_value")]
    pub serve_rating: Option<f64>,

    // Receive
    #[serde(with = "stat_value")]
    pub receive_perfect: Option<f64>,
    #[serde(with = "stat_value")]
    pub receive_positive: Option<f64>,
    #[serde(with = "stat_value")]
    pub receive_negative: Option<f64>,
    #[serde(with = "stat_value")]
    pub receive_error: Option<f64>,
    #[serde(with = "stat_value")]
    pub receive_attempts: Option<f64>,
    #[serde(with = "stat_value")]
    pub receive_percentage: Option<f64>,

    // Set
    #[serde(with = "stat_value")]
    pub set_assists: Option<f64>,
    #[serde(with = "stat_value")]
    pub sets_total: Option<f64>,
    #[serde(with = "stat_value")]
    pub set_errors: Option<f64>,

    // Dig
    #[serde(with = "stat_value")]
    pub digs: Option<f64>,
    #[serde(with = "stat_value")]
    pub dig_errors: Option<f64>,

    // Block
    #[serde(with = "stat_value")]
    pub block_single: Option<f64>,
    #[serde(with = "stat_value")]
    pub block_multiple: Option<f64>,
    #[serde(with = "stat_value")]
    pub block_errors: Option<f64>,
    #[serde(with = "stat_value")]
    pub blocks_per_set: Option<f64>,

    #[serde(with = "stat_value")]
    pub sets_played: Option<f64>,
}

/// Serde format for optional stat values.
///
/// JSON has no NaN or infinity, and `serde_json` would write them as
/// `null`, turning a malformed cell into a blank one on reload. Non-finite
/// values are written as strings (`"NaN"`, `"inf"`, `"-inf"`) instead.
/// Reading accepts numbers, those strings, numeric strings and `null`.
pub mod stat_value {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            None => serializer.serialize_none(),
            Some(v) if v.is_finite() => serializer.serialize_some(v),
            Some(v) => serializer.serialize_some(&v.to_string()),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val: Option<serde_json::Value> = Option::deserialize(deserializer)?;
        match val {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid stat value: {:?}", s))),
            Some(other) => Err(serde::de::Error::custom(format!(
                "invalid stat value: {}",
                other
            ))),
        }
    }
}

impl StatRow {
    /// Create an empty row for a named player.
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Read a numeric field by identifier.
    pub fn get(&self, field: StatField) -> Option<f64> {
        match field {
            StatField::Kills => self.kills,
            StatField::AttackErrors => self.attack_errors,
            StatField::AttackAttempts => self.attack_attempts,
            StatField::AttackEfficiency => self.attack_efficiency,
            StatField::KillsPerSet => self.kills_per_set,
            StatField::ServeAces => self.serve_aces,
            StatField::ServeErrors => self.serve_errors,
            StatField::ServeAttempts => self.serve_attempts,
            StatField::ServePercentage => self.serve_percentage,
            StatField::ServeEfficiency => self.serve_efficiency,
            StatField::ServeRating => self.serve_rating,
            StatField::ReceivePerfect => self.receive_perfect,
            StatField::ReceivePositive => self.receive_positive,
            StatField::ReceiveNegative => self.receive_negative,
            StatField::ReceiveError => self.receive_error,
            StatField::ReceiveAttempts => self.receive_attempts,
            StatField::ReceivePercentage => self.receive_percentage,
            StatField::SetAssists => self.set_assists,
            StatField::SetsTotal => self.sets_total,
            StatField::SetErrors => self.set_errors,
            StatField::Digs => self.digs,
            StatField::DigErrors => self.dig_errors,
            StatField::BlockSingle => self.block_single,
            StatField::BlockMultiple => self.block_multiple,
            StatField::BlockErrors => self.block_errors,
            StatField::BlocksPerSet => self.blocks_per_set,
            StatField::SetsPlayed => self.sets_played,
        }
    }

    /// Mutable access to a numeric field by identifier.
    pub fn slot_mut(&mut self, field: StatField) -> &mut Option<f64> {
        match field {
            StatField::Kills => &mut self.kills,
            StatField::AttackErrors => &mut self.attack_errors,
            StatField::AttackAttempts => &mut self.attack_attempts,
            StatField::AttackEfficiency => &mut self.attack_efficiency,
            StatField::KillsPerSet => &mut self.kills_per_set,
            StatField::ServeAces => &mut self.serve_aces,
            StatField::ServeErrors => &mut self.serve_errors,
            StatField::ServeAttempts => &mut self.serve_attempts,
            StatField::ServePercentage => &mut self.serve_percentage,
            StatField::ServeEfficiency => &mut self.serve_efficiency,
            StatField::ServeRating => &mut self.serve_rating,
            StatField::ReceivePerfect => &mut self.receive_perfect,
            StatField::ReceivePositive => &mut self.receive_positive,
            StatField::ReceiveNegative => &mut self.receive_negative,
            StatField::ReceiveError => &mut self.receive_error,
            StatField::ReceiveAttempts => &mut self.receive_attempts,
            StatField::ReceivePercentage => &mut self.receive_percentage,
            StatField::SetAssists => &mut self.set_assists,
            StatField::SetsTotal => &mut self.sets_total,
            StatField::SetErrors => &mut self.set_errors,
            StatField::Digs => &mut self.digs,
            StatField::DigErrors => &mut self.dig_errors,
            StatField::BlockSingle => &mut self.block_single,
            StatField::BlockMultiple => &mut self.block_multiple,
            StatField::BlockErrors => &mut self.block_errors,
            StatField::BlocksPerSet => &mut self.blocks_per_set,
            StatField::SetsPlayed => &mut self.sets_played,
        }
    }

    /// Write a numeric field by identifier.
    pub fn set(&mut self, field: StatField, value: Option<f64>) {
        *self.slot_mut(field) = value;
    }
}

/// How a field's value comes about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Raw tally, summed across rows.
    Counter,
    /// Computed from counters by a formula.
    Derived,
    /// Opaque rating taken from the source sheet; neither summed nor recomputed.
    Rating,
}

/// Identifier of a numeric [`StatRow`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Kills,
    AttackErrors,
    AttackAttempts,
    AttackEfficiency,
    KillsPerSet,
    ServeAces,
    ServeErrors,
    ServeAttempts,
    ServePercentage,
    ServeEfficiency,
    ServeRating,
    ReceivePerfect,
    ReceivePositive,
    ReceiveNegative,
    ReceiveError,
    ReceiveAttempts,
    ReceivePercentage,
    SetAssists,
    SetsTotal,
    SetErrors,
    Digs,
    DigErrors,
    BlockSingle,
    BlockMultiple,
    BlockErrors,
    BlocksPerSet,
    SetsPlayed,
}

impl StatField {
    /// Every field, in display order.
    pub const ALL: [StatField; 27] = [
        StatField::Kills,
        StatField::AttackErrors,
        StatField::AttackAttempts,
        StatField::AttackEfficiency,
        StatField::KillsPerSet,
        StatField::ServeAces,
        StatField::ServeErrors,
        StatField::ServeAttempts,
        StatField::ServePercentage,
        StatField::ServeEfficiency,
        StatField::ServeRating,
        StatField::ReceivePerfect,
        StatField::ReceivePositive,
        StatField::ReceiveNegative,
        StatField::ReceiveError,
        StatField::ReceiveAttempts,
        StatField::ReceivePercentage,
        StatField::SetAssists,
        StatField::SetsTotal,
        StatField::SetErrors,
        StatField::Digs,
        StatField::DigErrors,
        StatField::BlockSingle,
        StatField::BlockMultiple,
        StatField::BlockErrors,
        StatField::BlocksPerSet,
        StatField::SetsPlayed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatField::Kills => "kills",
            StatField::AttackErrors => "attack_errors",
            StatField::AttackAttempts => "attack_attempts",
            StatField::AttackEfficiency => "attack_efficiency",
            StatField::KillsPerSet => "kills_per_set",
            StatField::ServeAces => "serve_aces",
            StatField::ServeErrors => "serve_errors",
            StatField::ServeAttempts => "serve_attempts",
            StatField::ServePercentage => "serve_percentage",
            StatField::ServeEfficiency => "serve_efficiency",
            StatField::ServeRating => "serve_rating",
            StatField::ReceivePerfect => "receive_perfect",
            StatField::ReceivePositive => "receive_positive",
            StatField::ReceiveNegative => "receive_negative",
            StatField::ReceiveError => "receive_error",
            StatField::ReceiveAttempts => "receive_attempts",
            StatField::ReceivePercentage => "receive_percentage",
            StatField::SetAssists => "set_assists",
            StatField::SetsTotal => "sets_total",
            StatField::SetErrors => "set_errors",
            StatField::Digs => "digs",
            StatField::DigErrors => "dig_errors",
            StatField::BlockSingle => "block_single",
            StatField::BlockMultiple => "block_multiple",
            StatField::BlockErrors => "block_errors",
            StatField::BlocksPerSet => "blocks_per_set",
            StatField::SetsPlayed => "sets_played",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            StatField::AttackEfficiency
            | StatField::KillsPerSet
            | StatField::ServePercentage
            | StatField::ServeEfficiency
            | StatField::ReceivePercentage
            | StatField::BlocksPerSet => FieldKind::Derived,
            StatField::ServeRating => FieldKind::Rating,
            _ => FieldKind::Counter,
        }
    }

    pub fn is_counter(&self) -> bool {
        self.kind() == FieldKind::Counter
    }

    /// Iterate over the summable counter fields.
    pub fn counters() -> impl Iterator<Item = StatField> {
        Self::ALL.into_iter().filter(StatField::is_counter)
    }
}

impl std::fmt::Display for StatField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known stat field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown stat field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for StatField {
    type Err = UnknownField;

    /// Accepts the snake_case identifier or the camelCase column id used by
    /// table front-ends (`attackEfficiency`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .flat_map(|c| {
                if c.is_ascii_uppercase() {
                    vec!['_', c.to_ascii_lowercase()]
                } else {
                    vec![c]
                }
            })
            .collect();

        StatField::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
