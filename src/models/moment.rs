use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

/// A date as entered on a task or event.
///
/// Clients send plain days (`2025-03-01`), wall-clock times without an
/// offset (`2025-03-01T14:30`) or full RFC 3339 instants. The first two are
/// read in the viewer's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Moment {
    Day(NaiveDate),
    Local(NaiveDateTime),
    Instant(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMomentError(String);

impl fmt::Display for ParseMomentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid date {:?}", self.0)
    }
}

impl std::error::Error for ParseMomentError {}

impl Moment {
    /// The instant this moment denotes for a viewer at `offset`.
    pub fn resolve(&self, offset: FixedOffset) -> DateTime<Utc> {
        match self {
            Moment::Day(day) => local_to_utc(day.and_time(NaiveTime::MIN), offset),
            Moment::Local(dt) => local_to_utc(*dt, offset),
            Moment::Instant(dt) => dt.with_timezone(&Utc),
        }
    }

    /// The calendar day this moment falls on for a viewer at `offset`.
    pub fn local_day(&self, offset: FixedOffset) -> NaiveDate {
        match self {
            Moment::Day(day) => *day,
            Moment::Local(dt) => dt.date(),
            Moment::Instant(dt) => dt.with_timezone(&offset).date_naive(),
        }
    }
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    match offset.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&local),
    }
}

impl FromStr for Moment {
    type Err = ParseMomentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Moment::Instant(dt));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Moment::Local(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Moment::Day)
            .map_err(|_| ParseMomentError(s.to_string()))
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moment::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            Moment::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Moment::Instant(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl TryFrom<String> for Moment {
    type Error = ParseMomentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Moment> for String {
    fn from(value: Moment) -> Self {
        value.to_string()
    }
}
