//! Projection of raw upstream game log tables onto [`GameLogRow`].
//!
//! Only the fixed column set survives. Dates become `YYYY-MM-DD`,
//! percentages are scaled from fractions to 0-100 and row order is kept.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::core::GameLogRow;
use crate::error::{Result, StatsEngineError};
use crate::providers::ResultSet;

/// Normalize a raw game log table; an empty table yields an empty vec
pub fn normalize(raw: &ResultSet) -> Result<Vec<GameLogRow>> {
    raw.records()?
        .iter()
        .enumerate()
        .map(|(index, record)| {
            project(record).map_err(|message| {
                StatsEngineError::upstream(source_label(raw), format!("row {}: {}", index, message))
            })
        })
        .collect()
}

fn source_label(raw: &ResultSet) -> &str {
    if raw.name.is_empty() {
        "upstream"
    } else {
        &raw.name
    }
}

fn project(record: &Map<String, Value>) -> std::result::Result<GameLogRow, String> {
    let raw_date = text(record, "GAME_DATE")?;
    let game_date = format_game_date(&raw_date)
        .ok_or_else(|| format!("unrecognized GAME_DATE '{}'", raw_date))?;

    Ok(GameLogRow {
        game_date,
        matchup: text(record, "MATCHUP")?,
        points: count(record, "PTS")?,
        rebounds: count(record, "REB")?,
        assists: count(record, "AST")?,
        blocks: count(record, "BLK")?,
        steals: count(record, "STL")?,
        minutes: minutes(record)?,
        win_loss: lookup(record, "WL")
            .and_then(Value::as_str)
            .map(str::to_string),
        field_goal_pct: percentage(record, "FG_PCT")?,
        three_point_pct: percentage(record, "FG3_PCT")?,
        free_throw_pct: percentage(record, "FT_PCT")?,
    })
}

/// Format an upstream date ("APR 14, 2024", "2024-04-14", "2024-04-14T00:00:00")
/// as `YYYY-MM-DD`
pub fn format_game_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let date = NaiveDate::parse_from_str(raw, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%B %d, %Y"))
        .ok()
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })?;

    Some(date.format("%Y-%m-%d").to_string())
}

/// Scale a [0,1] fraction to [0,100], one decimal place
pub fn scale_percentage(fraction: f64) -> f64 {
    (fraction * 1000.0).round() / 10.0
}

fn lookup<'a>(record: &'a Map<String, Value>, column: &str) -> Option<&'a Value> {
    record.get(column).or_else(|| {
        record
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

fn required<'a>(record: &'a Map<String, Value>, column: &str) -> std::result::Result<&'a Value, String> {
    match lookup(record, column) {
        None => Err(format!("missing column {}", column)),
        Some(Value::Null) => Err(format!("null {}", column)),
        Some(value) => Ok(value),
    }
}

fn text(record: &Map<String, Value>, column: &str) -> std::result::Result<String, String> {
    required(record, column)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{} is not a string", column))
}

fn count(record: &Map<String, Value>, column: &str) -> std::result::Result<u32, String> {
    let value = required(record, column)?;

    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| format!("{} is not a count: {}", column, value))
}

/// Minutes come as a number or as "MM:SS"
fn minutes(record: &Map<String, Value>) -> std::result::Result<f64, String> {
    let value = required(record, "MIN")?;

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().split_once(':') {
            Some((mins, secs)) => match (mins.parse::<f64>(), secs.parse::<f64>()) {
                (Ok(m), Ok(s)) if s < 60.0 => Some(((m + s / 60.0) * 10.0).round() / 10.0),
                _ => None,
            },
            None => s.trim().parse::<f64>().ok(),
        },
        _ => None,
    };

    parsed
        .filter(|m| *m >= 0.0)
        .ok_or_else(|| format!("MIN is not a duration: {}", value))
}

/// Absent column or null cell is `None`
fn percentage(record: &Map<String, Value>, column: &str) -> std::result::Result<Option<f64>, String> {
    match lookup(record, column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|f| Some(scale_percentage(f)))
            .ok_or_else(|| format!("{} is not a number", column)),
        Some(other) => Err(format!("{} is not a number: {}", column, other)),
    }
}
