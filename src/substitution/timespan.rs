//! Time-span values in the `[-][d.]hh:mm[:ss[.fffffff]]` notation.
//!
//! Durations have no JSON type of their own; configuration files carry them
//! as strings such as `"00:30:00"` or `"1.12:00:00"`. A span is stored as a
//! signed count of 100-nanosecond ticks so the seven fractional digits of the
//! notation round-trip exactly.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

pub const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: i64 = 60 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: i64 = 24 * TICKS_PER_HOUR;
const FRACTION_DIGITS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan {
    ticks: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseTimeSpanError {
    #[error("expected [-][d.]hh:mm[:ss[.fffffff]]")]
    Format,

    #[error("{0} component is out of range")]
    Component(&'static str),

    #[error("time span is too large")]
    Overflow,
}

static CLOCK_PATTERN: OnceLock<Regex> = OnceLock::new();
static DAYS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn clock_pattern() -> &'static Regex {
    CLOCK_PATTERN.get_or_init(|| {
        Regex::new(r"^(-)?(?:(\d+)\.)?(\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:\.(\d{1,7}))?)?$")
            .expect("invalid time span regex")
    })
}

fn days_pattern() -> &'static Regex {
    DAYS_PATTERN.get_or_init(|| Regex::new(r"^(-)?(\d+)$").expect("invalid day count regex"))
}

impl TimeSpan {
    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    pub const fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        seconds.checked_mul(TICKS_PER_SECOND).map(Self::from_ticks)
    }

    /// Parse the `[-][d.]hh:mm[:ss[.fffffff]]` clock notation only. Unlike
    /// [`FromStr`], a bare day count such as `"3"` is rejected.
    pub fn parse_clock(s: &str) -> Result<Self, ParseTimeSpanError> {
        let caps = clock_pattern()
            .captures(s.trim())
            .ok_or(ParseTimeSpanError::Format)?;
        let days = component(caps.get(2), i64::MAX, "days")?;
        let hours = component(caps.get(3), 23, "hours")?;
        let minutes = component(caps.get(4), 59, "minutes")?;
        let seconds = component(caps.get(5), 59, "seconds")?;
        let fraction = match caps.get(6) {
            Some(m) => {
                let padded = format!("{:0<width$}", m.as_str(), width = FRACTION_DIGITS);
                padded.parse::<i64>().map_err(|_| ParseTimeSpanError::Format)?
            }
            None => 0,
        };

        let ticks = [
            scale(days, TICKS_PER_DAY)?,
            hours * TICKS_PER_HOUR,
            minutes * TICKS_PER_MINUTE,
            seconds * TICKS_PER_SECOND,
            fraction,
        ]
        .into_iter()
        .try_fold(0i64, |acc, part| acc.checked_add(part))
        .ok_or(ParseTimeSpanError::Overflow)?;

        Ok(Self::from_ticks(if caps.get(1).is_some() { -ticks } else { ticks }))
    }
}

fn component(raw: Option<regex::Match<'_>>, max: i64, name: &'static str) -> Result<i64, ParseTimeSpanError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    let value: i64 = raw
        .as_str()
        .parse()
        .map_err(|_| ParseTimeSpanError::Overflow)?;
    if value > max {
        return Err(ParseTimeSpanError::Component(name));
    }
    Ok(value)
}

fn scale(value: i64, unit: i64) -> Result<i64, ParseTimeSpanError> {
    value.checked_mul(unit).ok_or(ParseTimeSpanError::Overflow)
}

impl FromStr for TimeSpan {
    type Err = ParseTimeSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(caps) = days_pattern().captures(s) {
            let days = component(caps.get(2), i64::MAX, "days")?;
            let ticks = scale(days, TICKS_PER_DAY)?;
            return Ok(Self::from_ticks(if caps.get(1).is_some() { -ticks } else { ticks }));
        }

        Self::parse_clock(s)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.ticks.unsigned_abs();
        if self.ticks < 0 {
            write!(f, "-")?;
        }

        let day = TICKS_PER_DAY as u64;
        let days = magnitude / day;
        let rem = magnitude % day;
        let hours = rem / TICKS_PER_HOUR as u64;
        let minutes = (rem % TICKS_PER_HOUR as u64) / TICKS_PER_MINUTE as u64;
        let seconds = (rem % TICKS_PER_MINUTE as u64) / TICKS_PER_SECOND as u64;
        let fraction = rem % TICKS_PER_SECOND as u64;

        if days > 0 {
            write!(f, "{}.", days)?;
        }
        write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)?;
        if fraction > 0 {
            write!(f, ".{:07}", fraction)?;
        }
        Ok(())
    }
}
