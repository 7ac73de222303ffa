use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::time_window::{TimeWindow, WindowError};

/// A personal-training session between one member and one trainer in one room.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PtSession {
    pub id: i64,
    pub member_id: i64,
    pub trainer_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub status: SessionStatus,
    pub notes: Option<String>,
}

impl PtSession {
    pub fn window(&self) -> Result<TimeWindow, WindowError> {
        TimeWindow::on_date(self.date, self.start, self.end)
    }

    pub fn is_active(&self) -> bool {
        self.status != SessionStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" => SessionStatus::Completed,
            "cancelled" => SessionStatus::Cancelled,
            _ => SessionStatus::Scheduled,
        }
    }
}
