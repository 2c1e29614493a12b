//! Print duration codec.
//!
//! Backends report `print_time` either as a number of seconds or as an
//! `H:MM:SS[.micro]` string. Both decode to whole seconds; encoding always
//! produces the zero-padded `HH:MM:SS` form. Use it as a field attribute:
//! `#[serde(with = "shared::print_time")]`.

use serde::{de, Deserialize, Deserializer, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrintTimeError {
    #[error("print time {0:?} is not in H:MM:SS form")]
    Malformed(String),
    #[error("print time {0:?} is out of range")]
    OutOfRange(String),
    #[error("print time {0} is negative or not finite")]
    InvalidSeconds(f64),
}

pub fn format_print_time(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

pub fn parse_print_time(raw: &str) -> Result<u64, PrintTimeError> {
    let trimmed = raw.trim();
    let (clock, fraction) = match trimmed.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (trimmed, None),
    };
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrintTimeError::Malformed(raw.to_string()));
        }
    }

    let fields = clock
        .split(':')
        .map(|field| {
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            field.parse::<u64>().ok()
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| PrintTimeError::Malformed(raw.to_string()))?;

    let &[hours, minutes, seconds] = fields.as_slice() else {
        return Err(PrintTimeError::Malformed(raw.to_string()));
    };
    if minutes > 59 || seconds > 59 {
        return Err(PrintTimeError::OutOfRange(raw.to_string()));
    }
    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| PrintTimeError::OutOfRange(raw.to_string()))
}

pub fn seconds_from_float(value: f64) -> Result<u64, PrintTimeError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PrintTimeError::InvalidSeconds(value));
    }
    Ok(value.trunc() as u64)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Seconds(u64),
    Fractional(f64),
    Clock(String),
}

pub fn serialize<S>(seconds: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_print_time(*seconds))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Repr::deserialize(deserializer)? {
        Repr::Seconds(seconds) => Ok(seconds),
        Repr::Fractional(value) => seconds_from_float(value).map_err(de::Error::custom),
        Repr::Clock(raw) => parse_print_time(&raw).map_err(de::Error::custom),
    }
}

#[cfg(test)]
#[path = "tests/print_time_tests.rs"]
mod tests;
