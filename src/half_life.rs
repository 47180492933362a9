//! Half-life parsing
//!
//! Nuclear data stores carry half-lives as free text ("4.468e9 y",
//! "8.02 d", "stable"). This module turns such strings into seconds and
//! decay constants. Unit inference is substring based and checked in a
//! fixed precedence order, so "ms" resolves to minutes because "m" is
//! tested first. Stored half-life strings depend on that order.

use regex::Regex;
use std::sync::OnceLock;

/// Lenient numeric token, e.g. "4.468e9" in "4.468e9 y"
static NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Strings meaning "does not decay"
const NO_DECAY: [&str; 5] = ["", "stable", "infinity", "inf", "∞"];

pub const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;
pub const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

fn number_pattern() -> &'static Regex {
    NUMBER_PATTERN
        .get_or_init(|| Regex::new(r"[0-9.]+e?[0-9]*").expect("half-life pattern is valid"))
}

/// Time unit inferred from a half-life string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Year,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    /// Precedence order used for inference: first match wins.
    const PRECEDENCE: [(TimeUnit, &'static [&'static str]); 8] = [
        (TimeUnit::Year, &["y", "year"]),
        (TimeUnit::Day, &["d", "day"]),
        (TimeUnit::Hour, &["h", "hour"]),
        (TimeUnit::Minute, &["m", "min"]),
        (TimeUnit::Second, &["s", "sec"]),
        (TimeUnit::Millisecond, &["ms", "millisecond"]),
        (TimeUnit::Microsecond, &["μs", "microsecond"]),
        (TimeUnit::Nanosecond, &["ns", "nanosecond"]),
    ];

    /// Seconds per unit
    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Year => SECONDS_PER_YEAR,
            TimeUnit::Day => SECONDS_PER_DAY,
            TimeUnit::Hour => 3600.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Second => 1.0,
            TimeUnit::Millisecond => 1e-3,
            TimeUnit::Microsecond => 1e-6,
            TimeUnit::Nanosecond => 1e-9,
        }
    }

    /// Infer the unit from a lower-cased half-life string
    pub fn infer(lower: &str) -> Option<TimeUnit> {
        Self::PRECEDENCE
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|token| lower.contains(token)))
            .map(|(unit, _)| *unit)
    }
}

/// Half-life in seconds, or `None` for stable and unparseable strings.
///
/// A number without a recognizable unit is taken as seconds.
pub fn parse_half_life_seconds(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    if NO_DECAY.contains(&lower.as_str()) {
        return None;
    }

    let token = number_pattern().find(trimmed)?;
    let value: f64 = match token.as_str().parse() {
        Ok(value) => value,
        Err(_) => {
            log::debug!("Unparseable half-life '{}'", text);
            return None;
        }
    };

    let seconds = match TimeUnit::infer(&lower) {
        Some(unit) => value * unit.seconds(),
        None => value,
    };

    if seconds > 0.0 {
        Some(seconds)
    } else {
        None
    }
}

/// Decay constant λ = ln 2 / T½ in 1/s; zero when the isotope does not decay.
pub fn decay_constant(half_life: Option<&str>) -> f64 {
    match half_life.and_then(parse_half_life_seconds) {
        Some(seconds) => std::f64::consts::LN_2 / seconds,
        None => 0.0,
    }
}

/// Inverse of [`decay_constant`]; `None` for λ = 0.
pub fn half_life_from_decay_constant(lambda: f64) -> Option<f64> {
    if lambda > 0.0 {
        Some(std::f64::consts::LN_2 / lambda)
    } else {
        None
    }
}
