//! Best-effort coercion of loosely-typed JSON values.
//!
//! Every function here returns a value: failures fall back to a default and say so
//! through `Coerced::defaulted`, so callers can count silent fallbacks.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A coerced value plus whether it came from the fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coerced<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Coerced<T> {
    #[inline]
    pub fn parsed(value: T) -> Self {
        Self { value, defaulted: false }
    }
    #[inline]
    pub fn fallback(value: T) -> Self {
        Self { value, defaulted: true }
    }
}

fn digit_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

fn scaled_re() -> &'static Regex {
    // "1.2万", "3k", "2.5 M", "12千"
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(万|w|千|k|m)(?:$|[^a-z])").expect("static regex"))
}

/// Coerce to a non-negative integer. Never panics.
pub fn coerce_int(v: &Value, default: u64) -> Coerced<u64> {
    match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Coerced::parsed(u)
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 0.0 && f < u64::MAX as f64 {
                    Coerced::parsed(f.trunc() as u64)
                } else {
                    Coerced::fallback(default)
                }
            } else {
                Coerced::fallback(default)
            }
        }
        Value::String(s) => coerce_int_str(s, default),
        _ => Coerced::fallback(default),
    }
}

/// String flavour of [`coerce_int`].
pub fn coerce_int_str(s: &str, default: u64) -> Coerced<u64> {
    let t = s.trim();
    if t.is_empty() || t.starts_with('-') {
        return Coerced::fallback(default);
    }
    let compact: String = t.chars().filter(|c| *c != ',' && *c != '_' && *c != '，').collect();
    if let Ok(u) = compact.parse::<u64>() {
        return Coerced::parsed(u);
    }
    if let Some(caps) = scaled_re().captures(&compact) {
        if let Ok(base) = caps[1].parse::<f64>() {
            let mult = match caps[2].to_lowercase().as_str() {
                "万" | "w" => 10_000.0,
                "千" | "k" => 1_000.0,
                "m" => 1_000_000.0,
                _ => 1.0,
            };
            let scaled = base * mult;
            if scaled.is_finite() && scaled < u64::MAX as f64 {
                return Coerced::parsed(scaled.round() as u64);
            }
        }
    }
    if let Ok(f) = compact.parse::<f64>() {
        if f.is_finite() && f >= 0.0 && f < u64::MAX as f64 {
            return Coerced::parsed(f.trunc() as u64);
        }
    }
    match digit_run_re().find(&compact).and_then(|m| m.as_str().parse::<u64>().ok()) {
        Some(u) => Coerced::parsed(u),
        None => Coerced::fallback(default),
    }
}

/// Tri-state boolean: `None` when the value says nothing usable.
pub fn coerce_opt_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "是" => Some(true),
            "false" | "no" | "n" | "0" | "否" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn coerce_bool(v: &Value, default: bool) -> Coerced<bool> {
    match coerce_opt_bool(v) {
        Some(b) => Coerced::parsed(b),
        None => Coerced::fallback(default),
    }
}

/// Non-empty trimmed string from a JSON string or number.
pub fn coerce_opt_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() { None } else { Some(t.to_string()) }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
