//! Meeting-time representations and their normalization onto one comparable axis.
//!
//! Catalog data describes a meeting either with period codes (`3`, `E1`) or with
//! clock strings (`10:40 AM`). Both are parsed once into [`TimeSpec`] and every
//! comparison happens on [`Interval`]s in the deployment's [`TimeUnit`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minutes past midnight at which period 1 begins.
pub const FIRST_PERIOD_START: u16 = 445;
/// Distance between the starts of two consecutive periods.
pub const PERIOD_STRIDE: u16 = 55;
/// How long a single period lasts.
pub const PERIOD_LENGTH_MINUTES: u16 = 50;
/// Highest daytime period number; evening periods continue after it.
pub const LAST_DAY_PERIOD: u8 = 11;
pub const EVENING_PERIODS: u8 = 3;
pub const LAST_PERIOD: u8 = LAST_DAY_PERIOD + EVENING_PERIODS;

static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*(AM|PM)?\s*$").expect("regex compiles")
});

/// Start of period `period` in minutes since midnight.
pub fn period_start_minutes(period: u8) -> u16 {
    FIRST_PERIOD_START + (u16::from(period.max(1)) - 1) * PERIOD_STRIDE
}

/// End of period `period` in minutes since midnight.
pub fn period_end_minutes(period: u8) -> u16 {
    period_start_minutes(period) + PERIOD_LENGTH_MINUTES
}

/// Period still in progress (or not yet begun) at `minutes`: the first one
/// whose end is at or after it.
fn first_period_ending_by(minutes: u16) -> Option<u8> {
    let first_end = period_end_minutes(1);
    let offset = minutes.saturating_sub(first_end).div_ceil(PERIOD_STRIDE);
    u8::try_from(offset + 1).ok().filter(|p| *p <= LAST_PERIOD)
}

/// Last period that has started at or before `minutes`.
fn last_period_started_by(minutes: u16) -> Option<u8> {
    let offset = minutes.checked_sub(FIRST_PERIOD_START)? / PERIOD_STRIDE;
    Some(u8::try_from(offset + 1).unwrap_or(LAST_PERIOD).min(LAST_PERIOD))
}

/// One end of a meeting block, resolved at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TimeSpec {
    /// Daytime period, `1..=11`.
    Period(u8),
    /// Evening period, `1..=3` for `E1..E3`.
    Evening(u8),
    /// Minutes since midnight.
    Clock(u16),
}

impl TimeSpec {
    /// Maps a bare period number onto the period family. 12..=14 are the evening codes.
    pub fn from_period_number(number: u8) -> Option<Self> {
        match number {
            1..=LAST_DAY_PERIOD => Some(Self::Period(number)),
            n if n > LAST_DAY_PERIOD && n <= LAST_DAY_PERIOD + EVENING_PERIODS => {
                Some(Self::Evening(n - LAST_DAY_PERIOD))
            }
            _ => None,
        }
    }

    /// Parses `"3"`, `" 11 "`, `"E2"` or `"e1"`. TBA and out-of-range codes yield `None`.
    pub fn parse_period(code: &str) -> Option<Self> {
        let code = code.trim();
        if let Some(rest) = code.strip_prefix(['E', 'e']) {
            let evening = rest.parse::<u8>().ok()?;
            return (1..=EVENING_PERIODS)
                .contains(&evening)
                .then_some(Self::Evening(evening));
        }
        code.parse::<u8>()
            .ok()
            .filter(|n| (1..=LAST_DAY_PERIOD).contains(n))
            .map(Self::Period)
    }

    /// Parses `"10:40 AM"`, `"1:55pm"` or a 24-hour `"18:00"` into minutes since midnight.
    pub fn parse_clock(text: &str) -> Option<Self> {
        let caps = CLOCK_RE.captures(text)?;
        let hour = caps[1].parse::<u16>().ok()?;
        let minute = caps[2].parse::<u16>().ok()?;
        if minute > 59 {
            return None;
        }
        let hour = match caps.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
            Some(meridiem) => {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                let base = hour % 12;
                if meridiem == "PM" { base + 12 } else { base }
            }
            None if hour <= 23 => hour,
            None => return None,
        };
        Some(Self::Clock(hour * 60 + minute))
    }

    /// Position on the period axis; clock times have none.
    pub fn period_number(self) -> Option<u8> {
        match self {
            Self::Period(n) => Some(n),
            Self::Evening(e) => Some(LAST_DAY_PERIOD + e),
            Self::Clock(_) => None,
        }
    }

    pub fn is_clock(self) -> bool {
        matches!(self, Self::Clock(_))
    }

    /// Clock times land on every period they touch.
    fn begin_period(self) -> Option<u8> {
        match self {
            Self::Clock(minutes) => first_period_ending_by(minutes),
            other => other.period_number(),
        }
    }

    fn end_period(self) -> Option<u8> {
        match self {
            Self::Clock(minutes) => last_period_started_by(minutes),
            other => other.period_number(),
        }
    }

    fn begin_minutes(self) -> u16 {
        match self {
            Self::Clock(minutes) => minutes,
            Self::Period(n) => period_start_minutes(n),
            Self::Evening(e) => period_start_minutes(LAST_DAY_PERIOD + e),
        }
    }

    fn end_minutes(self) -> u16 {
        match self {
            Self::Clock(minutes) => minutes,
            Self::Period(n) => period_end_minutes(n),
            Self::Evening(e) => period_end_minutes(LAST_DAY_PERIOD + e),
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Period(n) => write!(f, "{n}"),
            Self::Evening(e) => write!(f, "E{e}"),
            Self::Clock(minutes) => f.write_str(&format_clock(*minutes)),
        }
    }
}

/// Renders minutes since midnight as `"H:MM AM"`.
pub fn format_clock(minutes: u16) -> String {
    let (hour, minute) = (minutes / 60, minutes % 60);
    let meridiem = if (12..24).contains(&hour) { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display}:{minute:02} {meridiem}")
}

/// The axis every interval of one deployment is compared on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Minutes since midnight. Period codes are mapped with [`period_start_minutes`].
    #[default]
    Minutes,
    /// Period numbers `1..=14`. Clock-only blocks have no position here.
    Periods,
}

/// Whether intervals that only touch at an endpoint count as overlapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// `max(start) <= min(end)`: back-to-back blocks conflict.
    #[default]
    Closed,
    /// `max(start) < min(end)`: one block may begin where another ends.
    HalfOpen,
}

/// A closed `[start, end]` span in one [`TimeUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
}

impl Interval {
    pub fn new(start: u16, end: u16) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &Interval, policy: OverlapPolicy) -> bool {
        let (lo, hi) = (self.start.max(other.start), self.end.min(other.end));
        match policy {
            OverlapPolicy::Closed => lo <= hi,
            OverlapPolicy::HalfOpen => lo < hi,
        }
    }

    /// Shared part of two overlapping intervals.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        Interval::new(self.start.max(other.start), self.end.min(other.end))
    }
}

/// Begin and end of a meeting block, always from the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: TimeSpec,
    pub end: TimeSpec,
}

impl TimeSpan {
    /// Pairs two ends, refusing to mix clock times with period codes.
    pub fn new(begin: TimeSpec, end: TimeSpec) -> Option<Self> {
        (begin.is_clock() == end.is_clock()).then_some(Self { begin, end })
    }

    pub fn periods(begin: u8, end: u8) -> Option<Self> {
        Self::new(
            TimeSpec::from_period_number(begin)?,
            TimeSpec::from_period_number(end)?,
        )
    }

    pub fn clock(begin: &str, end: &str) -> Option<Self> {
        Self::new(TimeSpec::parse_clock(begin)?, TimeSpec::parse_clock(end)?)
    }

    /// Position of this span on `unit`'s axis. `None` when it ends before it
    /// begins, or when a clock span falls entirely outside the period grid.
    pub fn interval(&self, unit: TimeUnit) -> Option<Interval> {
        match unit {
            TimeUnit::Minutes => Interval::new(self.begin.begin_minutes(), self.end.end_minutes()),
            TimeUnit::Periods => Interval::new(
                u16::from(self.begin.begin_period()?),
                u16::from(self.end.end_period()?),
            ),
        }
    }
}
