//! Forgiving field decoders for loosely structured records.
//!
//! Incident records come from a browser form and a local store, so a flag may
//! arrive as `"true"` or `1` and a day count as `"5"`. Values of an unexpected
//! shape decode to `false` / `None` rather than rejecting the whole record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

const TRUTHY: &[&str] = &["true", "yes", "ja", "1", "x"];

pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => TRUTHY.contains(&s.trim().to_ascii_lowercase().as_str()),
        _ => false,
    })
}

/// Non-negative whole numbers only. Values beyond `u32::MAX` saturate.
pub(crate) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => match n.as_u64() {
            Some(v) => Some(saturate(v)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f.min(u32::MAX as f64) as u32),
        },
        Value::String(s) => s.trim().parse::<u64>().ok().map(saturate),
        _ => None,
    })
}

fn saturate(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?))
}

pub(crate) fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(scalar_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Decode a nested record, treating anything but a well-formed object as absent.
pub(crate) fn record<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}
