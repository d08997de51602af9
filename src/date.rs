//! Date normalization: an ordered chain of parsing strategies producing a canonical
//! `YYYY-MM-DD` date, or the original text when nothing matches.
//!
//! Relative phrases ("3 days ago", "3天前") resolve against an explicit reference
//! time. Reprocessing the same raw file on another day therefore yields different
//! dates for those records; pass a fixed reference to make a run reproducible.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime};

const CANONICAL: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Result of [`normalize_date`]: either a calendar date or the untouched input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedDate {
    Canonical(Date),
    Unparsed(String),
}

impl NormalizedDate {
    pub fn is_canonical(&self) -> bool {
        matches!(self, NormalizedDate::Canonical(_))
    }
    pub fn date(&self) -> Option<Date> {
        match self {
            NormalizedDate::Canonical(d) => Some(*d),
            NormalizedDate::Unparsed(_) => None,
        }
    }
    pub fn into_string(self) -> String {
        match self {
            NormalizedDate::Canonical(d) => format_canonical(d),
            NormalizedDate::Unparsed(s) => s,
        }
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedDate::Canonical(d) => f.write_str(&format_canonical(*d)),
            NormalizedDate::Unparsed(s) => f.write_str(s),
        }
    }
}

pub fn format_canonical(d: Date) -> String {
    d.format(CANONICAL)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day()))
}

/// Parse a canonical `YYYY-MM-DD` string (exact shape only).
pub fn parse_canonical(s: &str) -> Option<Date> {
    Date::parse(s.trim(), CANONICAL).ok()
}

/// One parsing attempt in the chain.
#[derive(Clone, Copy, Debug)]
pub enum DateStrategy {
    /// Whole-string date layout.
    DateLayout(&'static [BorrowedFormatItem<'static>]),
    /// Whole-string date-time layout; the time of day is discarded.
    DateTimeLayout(&'static [BorrowedFormatItem<'static>]),
    Rfc3339,
    /// "N <unit> ago" in English or Chinese, plus just-now/yesterday phrases.
    RelativeAgo,
    /// A `YYYY-M-D` shaped substring anywhere in the text.
    LooseYmd,
}

impl DateStrategy {
    pub fn apply(&self, s: &str, reference: OffsetDateTime) -> Option<Date> {
        match self {
            DateStrategy::DateLayout(fmt) => Date::parse(s, fmt).ok(),
            DateStrategy::DateTimeLayout(fmt) => PrimitiveDateTime::parse(s, fmt).ok().map(|dt| dt.date()),
            DateStrategy::Rfc3339 => OffsetDateTime::parse(s, &Rfc3339).ok().map(|dt| dt.date()),
            DateStrategy::RelativeAgo => parse_relative(s, reference),
            DateStrategy::LooseYmd => parse_loose_ymd(s),
        }
    }
}

/// Ordered strategy chain. First success wins.
#[derive(Clone, Debug)]
pub struct DateParser {
    strategies: Vec<DateStrategy>,
}

impl Default for DateParser {
    fn default() -> Self {
        Self {
            strategies: vec![
                DateStrategy::Rfc3339,
                DateStrategy::DateTimeLayout(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]Z"
                )),
                DateStrategy::DateTimeLayout(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z")),
                DateStrategy::DateTimeLayout(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
                )),
                DateStrategy::DateTimeLayout(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")),
                DateStrategy::DateTimeLayout(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")),
                DateStrategy::DateTimeLayout(format_description!("[year]-[month]-[day] [hour]:[minute]")),
                DateStrategy::DateLayout(CANONICAL),
                DateStrategy::DateLayout(format_description!("[year]/[month]/[day]")),
                DateStrategy::DateLayout(format_description!("[year]年[month padding:none]月[day padding:none]日")),
                DateStrategy::RelativeAgo,
                DateStrategy::LooseYmd,
            ],
        }
    }
}

impl DateParser {
    pub fn with_strategies(strategies: Vec<DateStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[DateStrategy] {
        &self.strategies
    }

    pub fn parse(&self, raw: &str, reference: OffsetDateTime) -> NormalizedDate {
        let s = raw.trim();
        if s.is_empty() {
            return NormalizedDate::Unparsed(raw.to_string());
        }
        for strategy in &self.strategies {
            if let Some(d) = strategy.apply(s, reference) {
                return NormalizedDate::Canonical(d);
            }
        }
        NormalizedDate::Unparsed(raw.to_string())
    }
}

fn default_parser() -> &'static DateParser {
    static P: OnceLock<DateParser> = OnceLock::new();
    P.get_or_init(DateParser::default)
}

/// Normalize a raw date string with the default strategy chain. Never fails.
pub fn normalize_date(raw: &str, reference: OffsetDateTime) -> NormalizedDate {
    default_parser().parse(raw, reference)
}

/// Unix seconds to a calendar date (UTC).
pub fn date_from_epoch(ts: i64) -> Option<Date> {
    OffsetDateTime::from_unix_timestamp(ts).ok().map(|dt| dt.date())
}

// ----------------------------- Relative phrases -----------------------------

fn relative_en_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+)\s*(second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago\b")
            .expect("static regex")
    })
}

fn relative_zh_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*(秒|分钟|小时|天|周|个月|月|年)\s*前").expect("static regex"))
}

// Months are 30 days and years 365 days.
fn unit_duration(unit: &str, n: i64) -> Option<Duration> {
    const DAY: i64 = 86_400;
    let secs_per_unit = match unit {
        "second" | "sec" | "秒" => 1,
        "minute" | "min" | "分钟" => 60,
        "hour" | "hr" | "小时" => 3_600,
        "day" | "天" => DAY,
        "week" | "周" => 7 * DAY,
        "month" | "个月" | "月" => 30 * DAY,
        "year" | "年" => 365 * DAY,
        _ => return None,
    };
    n.checked_mul(secs_per_unit).map(Duration::seconds)
}

fn parse_relative(s: &str, reference: OffsetDateTime) -> Option<Date> {
    let low = s.to_lowercase();
    match low.as_str() {
        "just now" | "刚刚" | "today" | "今天" => return Some(reference.date()),
        "yesterday" | "昨天" => return reference.date().previous_day(),
        _ => {}
    }
    let (n, unit) = if let Some(c) = relative_en_re().captures(&low) {
        (c[1].parse::<i64>().ok()?, c[2].to_string())
    } else if let Some(c) = relative_zh_re().captures(s) {
        (c[1].parse::<i64>().ok()?, c[2].to_string())
    } else {
        return None;
    };
    let delta = unit_duration(&unit, n)?;
    reference.checked_sub(delta).map(|dt| dt.date())
}

// ----------------------------- Loose extraction -----------------------------

fn loose_ymd_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})").expect("static regex"))
}

fn parse_loose_ymd(s: &str) -> Option<Date> {
    let caps = loose_ymd_re().captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u8 = caps[2].parse().ok()?;
    let day: u8 = caps[3].parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// Named, inclusive date range used for period-bucketed reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

impl TimePeriod {
    pub fn new(name: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { name: name.into(), start_date: start.into(), end_date: end.into() }
    }

    /// Inclusive on both ends. Periods with unparseable bounds contain nothing.
    pub fn contains(&self, d: Date) -> bool {
        match (parse_canonical(&self.start_date), parse_canonical(&self.end_date)) {
            (Some(lo), Some(hi)) => d >= lo && d <= hi,
            _ => false,
        }
    }
}
