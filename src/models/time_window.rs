use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("start {start} must be before end {end}")]
    StartNotBeforeEnd { start: String, end: String },

    #[error("duration must be positive, got {0} minutes")]
    NonPositiveDuration(i64),

    #[error("duration of {0} minutes is out of range")]
    DurationOutOfRange(i64),
}

/// The day a window applies to: one calendar date, or every week on a weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowDay {
    Date(NaiveDate),
    #[serde(serialize_with = "weekday_name::serialize")]
    Weekday(Weekday),
}

impl WindowDay {
    /// Whether both days can ever be the same calendar day.
    pub fn matches(&self, other: &WindowDay) -> bool {
        match (self, other) {
            (WindowDay::Date(a), WindowDay::Date(b)) => a == b,
            (WindowDay::Weekday(a), WindowDay::Weekday(b)) => a == b,
            (WindowDay::Weekday(w), WindowDay::Date(d))
            | (WindowDay::Date(d), WindowDay::Weekday(w)) => d.weekday() == *w,
        }
    }
}

/// Times are stored to the second; anything finer is dropped before a window
/// is validated so that what passes validation is what gets stored.
fn whole_seconds(t: NaiveTime) -> NaiveTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Half-open `[start, end)` time range on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub day: WindowDay,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(day: WindowDay, start: NaiveTime, end: NaiveTime) -> Result<Self, WindowError> {
        let (start, end) = (whole_seconds(start), whole_seconds(end));
        if start >= end {
            return Err(WindowError::StartNotBeforeEnd {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(Self { day, start, end })
    }

    pub fn on_date(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, WindowError> {
        Self::new(WindowDay::Date(date), start, end)
    }

    pub fn weekly(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Result<Self, WindowError> {
        Self::new(WindowDay::Weekday(weekday), start, end)
    }

    /// The concrete date, if this is not a recurring window.
    pub fn date(&self) -> Option<NaiveDate> {
        match self.day {
            WindowDay::Date(d) => Some(d),
            WindowDay::Weekday(_) => None,
        }
    }

    /// Touching windows (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.day.matches(&other.day) && self.start < other.end && other.start < self.end
    }

    /// `other` lies entirely inside `self`.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.day.matches(&other.day) && self.start <= other.start && self.end >= other.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            WindowDay::Date(d) => write!(f, "{}", d.format("%Y-%m-%d"))?,
            WindowDay::Weekday(w) => write!(f, "{}s", weekday_name::to_str(w))?,
        }
        write!(f, " {}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Half-open `[start, end)` timestamp range, used where bookings carry a
/// start timestamp plus a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Span {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, WindowError> {
        let start = start.with_nanosecond(0).unwrap_or(start);
        let end = end.with_nanosecond(0).unwrap_or(end);
        if start >= end {
            return Err(WindowError::StartNotBeforeEnd {
                start: start.format("%Y-%m-%d %H:%M").to_string(),
                end: end.format("%Y-%m-%d %H:%M").to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn from_duration(start: NaiveDateTime, minutes: i64) -> Result<Self, WindowError> {
        if minutes <= 0 {
            return Err(WindowError::NonPositiveDuration(minutes));
        }
        let end = Duration::try_minutes(minutes)
            .and_then(|d| start.checked_add_signed(d))
            .ok_or(WindowError::DurationOutOfRange(minutes))?;
        Self::new(start, end)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Full English weekday names ("Monday"), the stored representation.
pub mod weekday_name {
    use chrono::Weekday;
    use serde::Serializer;

    pub fn to_str(w: Weekday) -> &'static str {
        match w {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// Accepts full or three-letter names, any case.
    pub fn parse(s: &str) -> Option<Weekday> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Some(Weekday::Mon),
            "tuesday" | "tue" => Some(Weekday::Tue),
            "wednesday" | "wed" => Some(Weekday::Wed),
            "thursday" | "thu" => Some(Weekday::Thu),
            "friday" | "fri" => Some(Weekday::Fri),
            "saturday" | "sat" => Some(Weekday::Sat),
            "sunday" | "sun" => Some(Weekday::Sun),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(w: &Weekday, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(to_str(*w))
    }
}
