use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use super::time_window::{weekday_name, TimeWindow, WindowDay, WindowError};

/// Recurring weekly, or a single calendar date. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "on")]
pub enum AvailabilityKind {
    #[serde(serialize_with = "weekday_name::serialize")]
    Recurring(Weekday),
    SingleDate(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityKindError {
    #[error("recurring availability requires a day of week")]
    MissingWeekday,
    #[error("single-date availability requires a specific date")]
    MissingDate,
    #[error("invalid weekday: {0}")]
    InvalidWeekday(String),
}

impl AvailabilityKind {
    /// Build the kind from the loose `(is_recurring, day_of_week, specific_date)`
    /// triple collaborators send. The field that does not apply is ignored.
    pub fn from_parts(
        is_recurring: bool,
        day_of_week: Option<&str>,
        specific_date: Option<NaiveDate>,
    ) -> Result<Self, AvailabilityKindError> {
        if is_recurring {
            let raw = day_of_week.ok_or(AvailabilityKindError::MissingWeekday)?;
            weekday_name::parse(raw)
                .map(AvailabilityKind::Recurring)
                .ok_or_else(|| AvailabilityKindError::InvalidWeekday(raw.to_string()))
        } else {
            specific_date
                .map(AvailabilityKind::SingleDate)
                .ok_or(AvailabilityKindError::MissingDate)
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, AvailabilityKind::Recurring(_))
    }

    pub fn day(&self) -> WindowDay {
        match *self {
            AvailabilityKind::Recurring(w) => WindowDay::Weekday(w),
            AvailabilityKind::SingleDate(d) => WindowDay::Date(d),
        }
    }
}

/// A block of time a trainer has declared themselves available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub id: i64,
    pub trainer_id: i64,
    pub kind: AvailabilityKind,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Availability {
    pub fn window(&self) -> Result<TimeWindow, WindowError> {
        TimeWindow::new(self.kind.day(), self.start, self.end)
    }
}

/// One line per entry, recurring entries first, for diagnostics.
pub fn to_human_readable(entries: &[Availability]) -> String {
    let mut sorted: Vec<&Availability> = entries.iter().collect();
    sorted.sort_by_key(|a| match a.kind {
        AvailabilityKind::Recurring(w) => (0, w.num_days_from_monday() as i64, a.start),
        AvailabilityKind::SingleDate(d) => (1, d.num_days_from_ce() as i64, a.start),
    });

    sorted
        .iter()
        .map(|a| {
            let day = match a.kind {
                AvailabilityKind::Recurring(w) => format!("{}s", weekday_name::to_str(w)),
                AvailabilityKind::SingleDate(d) => d.format("%Y-%m-%d").to_string(),
            };
            format!("{day}: {}-{}", a.start.format("%H:%M"), a.end.format("%H:%M"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn entry(kind: AvailabilityKind, start: &str, end: &str) -> Availability {
        Availability {
            id: 1,
            trainer_id: 1,
            kind,
            start: t(start),
            end: t(end),
        }
    }

    #[test]
    fn test_from_parts_recurring() {
        let kind = AvailabilityKind::from_parts(true, Some("Monday"), None).unwrap();
        assert_eq!(kind, AvailabilityKind::Recurring(Weekday::Mon));
    }

    #[test]
    fn test_from_parts_ignores_irrelevant_field() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let kind = AvailabilityKind::from_parts(false, Some("Monday"), Some(date)).unwrap();
        assert_eq!(kind, AvailabilityKind::SingleDate(date));
    }

    #[test]
    fn test_from_parts_missing_fields() {
        assert_eq!(
            AvailabilityKind::from_parts(true, None, None),
            Err(AvailabilityKindError::MissingWeekday)
        );
        assert_eq!(
            AvailabilityKind::from_parts(false, Some("Monday"), None),
            Err(AvailabilityKindError::MissingDate)
        );
        assert!(matches!(
            AvailabilityKind::from_parts(true, Some("Funday"), None),
            Err(AvailabilityKindError::InvalidWeekday(_))
        ));
    }

    #[test]
    fn test_to_human_readable() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();
        let entries = vec![
            entry(AvailabilityKind::SingleDate(date), "13:00", "15:00"),
            entry(AvailabilityKind::Recurring(Weekday::Fri), "10:00", "16:00"),
            entry(AvailabilityKind::Recurring(Weekday::Mon), "09:00", "17:00"),
        ];
        assert_eq!(
            to_human_readable(&entries),
            "Mondays: 09:00-17:00, Fridays: 10:00-16:00, 2025-06-18: 13:00-15:00"
        );
    }

    #[test]
    fn test_to_human_readable_empty() {
        assert_eq!(to_human_readable(&[]), "");
    }
}
