//! Stat sheet import.
//!
//! Turns spreadsheet exports (one header row, one player per line) into
//! [`StatRow`]s. Values are taken as-is: a blank cell is `None`, text that
//! is not a number becomes `NaN` without raising an error, and summary
//! lines ("Team Total", empty names) are dropped.

use std::collections::HashMap;
use std::io::Read;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{StatField, StatRow};

/// Errors raised while reading a stat sheet.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Header of the player name column.
pub const NAME_HEADER: &str = "Name";

/// Recognised sheet headers and the field each fills.
pub const CSV_HEADERS: [(&str, StatField); 27] = [
    ("Attack K", StatField::Kills),
    ("Attack E", StatField::AttackErrors),
    ("Attack TA", StatField::AttackAttempts),
    ("Attack Atk%", StatField::AttackEfficiency),
    ("Attack K/S", StatField::KillsPerSet),
    ("Serve SA", StatField::ServeAces),
    ("Serve SE", StatField::ServeErrors),
    ("Serve TA", StatField::ServeAttempts),
    ("Serve Pct", StatField::ServePercentage),
    ("Serve Eff", StatField::ServeEfficiency),
    ("Serve Rtg.", StatField::ServeRating),
    ("Receive 3", StatField::ReceivePerfect),
    ("Receive 2", StatField::ReceivePositive),
    ("Receive 1", StatField::ReceiveNegative),
    ("Receive 0", StatField::ReceiveError),
    ("Receive TA", StatField::ReceiveAttempts),
    ("Receive Pass%", StatField::ReceivePercentage),
    ("Set Ast", StatField::SetAssists),
    ("Set TA", StatField::SetsTotal),
    ("Set SE", StatField::SetErrors),
    ("Dig DS", StatField::Digs),
    ("Dig DE", StatField::DigErrors),
    ("Block BS", StatField::BlockSingle),
    ("Block BA", StatField::BlockMultiple),
    ("Block BE", StatField::BlockErrors),
    ("Block B/S", StatField::BlocksPerSet),
    ("Sets Sets Played", StatField::SetsPlayed),
];

/// Look up the field a sheet header maps to.
pub fn field_for_header(header: &str) -> Option<StatField> {
    CSV_HEADERS
        .iter()
        .find(|(h, _)| *h == header)
        .map(|(_, field)| *field)
}

/// Result of reading one sheet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedSheet {
    pub rows: Vec<StatRow>,
    /// Data lines dropped as summaries or nameless
    pub skipped: usize,
    /// Headers that map to no field
    pub unrecognized_headers: Vec<String>,
}

/// Remove a wrapping double quote at either end.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Blank → `None`; anything else is parsed as a float, `NaN` if it is not one.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value = strip_quotes(raw).trim();
    if value.is_empty() {
        return None;
    }
    Some(value.parse::<f64>().unwrap_or(f64::NAN))
}

/// Whether a player name marks a summary or placeholder line.
pub fn is_summary_name(name: &str) -> bool {
    name.is_empty() || name.to_lowercase().contains("total")
}

/// Build a row from one header → value record.
///
/// `index` becomes the row's ID until it is saved against a game.
/// Returns `None` for summary lines.
pub fn normalize_record(record: &HashMap<String, String>, index: usize) -> Option<StatRow> {
    let name = record
        .get(NAME_HEADER)
        .map(|n| strip_quotes(n).trim().to_string())
        .unwrap_or_default();

    if is_summary_name(&name) {
        return None;
    }

    let mut row = StatRow::new(index.to_string(), name);
    for (header, field) in CSV_HEADERS {
        if let Some(raw) = record.get(header) {
            row.set(field, parse_number(raw));
        }
    }
    Some(row)
}

/// Parse a whole sheet. The first line holds the headers.
pub fn parse_csv<R: Read>(reader: R) -> Result<ParsedSheet, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| strip_quotes(h).trim().to_string())
        .collect();

    let unrecognized_headers: Vec<String> = headers
        .iter()
        .filter(|h| h.as_str() != NAME_HEADER && field_for_header(h).is_none())
        .cloned()
        .collect();
    if !unrecognized_headers.is_empty() {
        debug!("Ignoring unrecognized headers: {:?}", unrecognized_headers);
    }

    let mut sheet = ParsedSheet {
        unrecognized_headers,
        ..Default::default()
    };

    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();

        match normalize_record(&fields, index) {
            Some(row) => {
                if StatField::ALL
                    .into_iter()
                    .any(|f| row.get(f).is_some_and(f64::is_nan))
                {
                    warn!("Row {} ({}) has non-numeric values", index, row.name);
                }
                sheet.rows.push(row);
            }
            None => sheet.skipped += 1,
        }
    }

    debug!(
        "Parsed {} rows ({} skipped) from stat sheet",
        sheet.rows.len(),
        sheet.skipped
    );
    Ok(sheet)
}

/// Parse a sheet held in memory.
pub fn parse_csv_str(input: &str) -> Result<ParsedSheet, ImportError> {
    parse_csv(input.as_bytes())
}

/// Parse a sheet from a file.
pub fn parse_csv_file(path: &std::path::Path) -> Result<ParsedSheet, ImportError> {
    let file = std::fs::File::open(path)?;
    parse_csv(std::io::BufReader::new(file))
}
