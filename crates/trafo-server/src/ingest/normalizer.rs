//! Lenient field normalization
//!
//! Meter exports are inconsistent: decimal commas, voltages written as
//! clock-like `H:MM:SS` strings, blank cells. Numeric cells never fail a row,
//! anything unreadable becomes `None`. Only the timestamp is strict.

use chrono::NaiveDateTime;
use trafo_common::types::{Phase, PhaseValues};

use super::models::{
    ReadingInput, NormalizedReading, COL_AMPERE_R, COL_AMPERE_S, COL_AMPERE_T, COL_COSPHI,
    COL_DATETIME, COL_VOLTAGE_R, COL_VOLTAGE_S, COL_VOLTAGE_T,
};

/// Fixed layout of the `Datetime` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which normalization rules apply to a numeric cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Voltage,
    Current,
    PowerFactor,
}

/// Parse a numeric cell. Never fails; unreadable input is `None`.
pub fn normalize_number(raw: Option<&str>, kind: FieldKind) -> Option<f64> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let mut text = text.replace(',', ".");

    // "228:01:00" is a voltage exported through a time-formatted cell.
    if kind == FieldKind::Voltage && text.contains(':') {
        let mut segments = text.split(':');
        let whole = segments.next().unwrap_or_default();
        text = match segments.next() {
            Some(fraction) => format!("{}.{}", whole, fraction),
            None => whole.to_string(),
        };
    }

    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the `Datetime` cell. Blank is `Ok(None)`; any other mismatch is an error.
pub fn parse_timestamp(raw: Option<&str>) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map(Some),
        None => Ok(None),
    }
}

fn voltage_column(phase: Phase) -> &'static str {
    match phase {
        Phase::R => COL_VOLTAGE_R,
        Phase::S => COL_VOLTAGE_S,
        Phase::T => COL_VOLTAGE_T,
    }
}

fn current_column(phase: Phase) -> &'static str {
    match phase {
        Phase::R => COL_AMPERE_R,
        Phase::S => COL_AMPERE_S,
        Phase::T => COL_AMPERE_T,
    }
}

/// Normalize a whole row. Fails only when the timestamp is unreadable.
pub fn normalize_row(row: &ReadingInput) -> Result<NormalizedReading, chrono::ParseError> {
    Ok(NormalizedReading {
        measured_at: parse_timestamp(row.get(COL_DATETIME))?,
        voltage: PhaseValues::from_fn(|phase| {
            normalize_number(row.get(voltage_column(phase)), FieldKind::Voltage)
        }),
        current: PhaseValues::from_fn(|phase| {
            normalize_number(row.get(current_column(phase)), FieldKind::Current)
        }),
        cosphi: normalize_number(row.get(COL_COSPHI), FieldKind::PowerFactor),
    })
}
