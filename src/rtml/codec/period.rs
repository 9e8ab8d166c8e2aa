//! ISO-8601-like duration ("period") codec.
//!
//! Grammar: `P[nY][nM][nD][T[nH][nM][n(.n)S]]`. A year counts as 365 days and a
//! month as 30 days when converting to milliseconds.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::rtml::types::error::{Result, RtmlError};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * 1_000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
const MS_PER_MONTH: i64 = 30 * MS_PER_DAY;
const MS_PER_YEAR: i64 = 365 * MS_PER_DAY;

static PERIOD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn period_regex() -> &'static Regex {
    PERIOD_PATTERN.get_or_init(|| {
        Regex::new(
            r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:(T)(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d*)?)S)?)?$",
        )
        .expect("Invalid period regex pattern")
    })
}

/// A calendar-style duration.
///
/// Two periods compare equal when they describe the same number of
/// milliseconds, so `PT60M` equals `PT1H`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Period {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl Period {
    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// The seconds field as whole milliseconds.
    ///
    /// Negative and NaN seconds count as zero. Both `milliseconds` and
    /// `Display` go through this so formatted text reads back to the same length.
    fn seconds_millis(&self) -> i64 {
        (self.seconds.max(0.0) * MS_PER_SECOND as f64).round() as i64
    }

    /// Total length of the period in milliseconds.
    pub fn milliseconds(&self) -> i64 {
        i64::from(self.years) * MS_PER_YEAR
            + i64::from(self.months) * MS_PER_MONTH
            + i64::from(self.days) * MS_PER_DAY
            + i64::from(self.hours) * MS_PER_HOUR
            + i64::from(self.minutes) * MS_PER_MINUTE
            + self.seconds_millis()
    }

    /// Builds a period of days, hours, minutes and seconds from a millisecond count.
    ///
    /// Years and months are never produced since their length is conventional.
    pub fn from_milliseconds(ms: u64) -> Self {
        let ms = ms as i64;
        let days = ms / MS_PER_DAY;
        let hours = (ms % MS_PER_DAY) / MS_PER_HOUR;
        let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
        let millis = ms % MS_PER_MINUTE;
        Self {
            days: days as u32,
            hours: hours as u32,
            minutes: minutes as u32,
            seconds: millis as f64 / MS_PER_SECOND as f64,
            ..Self::default()
        }
    }

    pub fn from_hours(hours: u32) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes,
            ..Self::default()
        }
    }

    /// Parses period text, naming `field` in any error.
    pub fn parse(text: &str, field: &'static str) -> Result<Self> {
        let text = text.trim();
        let caps = period_regex()
            .captures(text)
            .ok_or_else(|| RtmlError::format(field, text, "not a P[nY][nM][nD][T[nH][nM][nS]] period"))?;

        let has_time_designator = caps.get(4).is_some();
        let has_time_fields = caps.get(5).is_some() || caps.get(6).is_some() || caps.get(7).is_some();
        if has_time_designator && !has_time_fields {
            return Err(RtmlError::format(field, text, "'T' must be followed by a time field"));
        }

        let int_at = |idx: usize| -> Result<u32> {
            caps.get(idx)
                .map(|m| m.as_str().parse::<u32>().map_err(|e| RtmlError::format(field, text, e)))
                .transpose()
                .map(Option::unwrap_or_default)
        };

        let seconds = caps
            .get(7)
            .map(|m| m.as_str().parse::<f64>().map_err(|e| RtmlError::format(field, text, e)))
            .transpose()?
            .unwrap_or(0.0);

        Ok(Self {
            years: int_at(1)?,
            months: int_at(2)?,
            days: int_at(3)?,
            hours: int_at(5)?,
            minutes: int_at(6)?,
            seconds,
        })
    }
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.milliseconds() == other.milliseconds()
    }
}

impl Eq for Period {}

impl FromStr for Period {
    type Err = RtmlError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text, "period")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milliseconds() == 0 {
            return f.write_str("PT0S");
        }

        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }

        let seconds_millis = self.seconds_millis();
        let has_seconds = seconds_millis != 0;
        if self.hours > 0 || self.minutes > 0 || has_seconds {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if has_seconds {
                write!(f, "{}S", format_seconds(seconds_millis))?;
            }
        }
        Ok(())
    }
}

/// Whole milliseconds as decimal seconds without trailing zeros.
fn format_seconds(millis: i64) -> String {
    let (whole, fraction) = (millis / MS_PER_SECOND, millis % MS_PER_SECOND);
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:03}", fraction);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
