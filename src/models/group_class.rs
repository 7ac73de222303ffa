use chrono::NaiveDateTime;
use serde::Serialize;

use super::time_window::{Span, WindowError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupClass {
    pub id: i64,
    pub admin_id: Option<i64>,
    pub trainer_id: i64,
    pub room_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub schedule_time: NaiveDateTime,
    pub duration_minutes: i64,
    pub capacity: i64,
}

impl GroupClass {
    /// `[schedule_time, schedule_time + duration)`.
    pub fn span(&self) -> Result<Span, WindowError> {
        Span::from_duration(self.schedule_time, self.duration_minutes)
    }
}
