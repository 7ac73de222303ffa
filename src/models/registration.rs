use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassRegistration {
    pub id: i64,
    pub member_id: i64,
    pub class_id: i64,
    pub registration_date: NaiveDateTime,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cancelled" => RegistrationStatus::Cancelled,
            _ => RegistrationStatus::Registered,
        }
    }
}
