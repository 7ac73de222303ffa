use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;
use rusqlite::ErrorCode;
use serde::Serialize;

use crate::models::availability::to_human_readable;
use crate::models::{
    Availability, AvailabilityKindError, GroupClass, PtSession, TimeWindow, WindowError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Member,
    Trainer,
    Room,
    GroupClass,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Member => "member",
            EntityKind::Trainer => "trainer",
            EntityKind::Room => "room",
            EntityKind::GroupClass => "class",
        })
    }
}

/// Whose calendar a conflict was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Member,
    Trainer,
    Room,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subject::Member => "member",
            Subject::Trainer => "trainer",
            Subject::Room => "room",
        })
    }
}

/// The existing booking that blocks a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictingBooking {
    Session(PtSession),
    Class(GroupClass),
}

impl fmt::Display for ConflictingBooking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictingBooking::Session(s) => write!(
                f,
                "session {} on {} {}-{}",
                s.id,
                s.date,
                s.start.format("%H:%M"),
                s.end.format("%H:%M")
            ),
            ConflictingBooking::Class(c) => write!(
                f,
                "class '{}' at {} ({} min)",
                c.title,
                c.schedule_time.format("%Y-%m-%d %H:%M"),
                c.duration_minutes
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("{subject} is already booked during that time: {existing}")]
    Conflict {
        subject: Subject,
        existing: Box<ConflictingBooking>,
    },

    #[error("trainer {trainer_id} is not available for {requested}")]
    Unavailable {
        trainer_id: i64,
        requested: TimeWindow,
        availability: Vec<Availability>,
    },

    #[error("capacity {requested} exceeds the maximum of {max}")]
    CapacityExceeded { requested: i64, max: i64 },

    #[error("capacity must be at least 1, got {0}")]
    InvalidCapacity(i64),

    #[error("invalid time window: {reason}")]
    InvalidWindow { reason: String },

    #[error("another booking committed first, retry: {0}")]
    TransientConflict(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("class {class_id} started at {schedule_time}, registration is closed")]
    PastDeadline {
        class_id: i64,
        schedule_time: NaiveDateTime,
    },

    #[error("member {member_id} is already registered for class {class_id}")]
    DuplicateRegistration { member_id: i64, class_id: i64 },

    #[error("class is full: {requested} registrations would exceed capacity {max}")]
    CapacityExceeded { requested: i64, max: i64 },

    #[error("another registration committed first, retry: {0}")]
    TransientConflict(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("invalid availability: {reason}")]
    InvalidWindow { reason: String },

    #[error("overlaps existing availability {existing_window}")]
    Overlap {
        existing: Box<Availability>,
        existing_window: String,
    },

    #[error("another change committed first, retry: {0}")]
    TransientConflict(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

/// SQLite gave up waiting for the write lock: another writer won the race.
pub(crate) fn is_transient(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

impl From<rusqlite::Error> for BookingError {
    fn from(e: rusqlite::Error) -> Self {
        if is_transient(&e) {
            BookingError::TransientConflict(e.to_string())
        } else {
            BookingError::Database(e)
        }
    }
}

impl From<rusqlite::Error> for RegistrationError {
    fn from(e: rusqlite::Error) -> Self {
        if is_transient(&e) {
            RegistrationError::TransientConflict(e.to_string())
        } else {
            RegistrationError::Database(e)
        }
    }
}

impl From<rusqlite::Error> for AvailabilityError {
    fn from(e: rusqlite::Error) -> Self {
        if is_transient(&e) {
            AvailabilityError::TransientConflict(e.to_string())
        } else {
            AvailabilityError::Database(e)
        }
    }
}

impl From<WindowError> for BookingError {
    fn from(e: WindowError) -> Self {
        BookingError::InvalidWindow {
            reason: e.to_string(),
        }
    }
}

impl From<WindowError> for AvailabilityError {
    fn from(e: WindowError) -> Self {
        AvailabilityError::InvalidWindow {
            reason: e.to_string(),
        }
    }
}

impl From<AvailabilityKindError> for AvailabilityError {
    fn from(e: AvailabilityKindError) -> Self {
        AvailabilityError::InvalidWindow {
            reason: e.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Booking(e) => match e {
                BookingError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                BookingError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
                BookingError::Unavailable { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "unavailable")
                }
                BookingError::CapacityExceeded { .. } => {
                    (StatusCode::CONFLICT, "capacity_exceeded")
                }
                BookingError::InvalidCapacity(_) => (StatusCode::BAD_REQUEST, "invalid_capacity"),
                BookingError::InvalidWindow { .. } => (StatusCode::BAD_REQUEST, "invalid_window"),
                BookingError::TransientConflict(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "transient_conflict")
                }
                BookingError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            },
            AppError::Registration(e) => match e {
                RegistrationError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                RegistrationError::PastDeadline { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "past_deadline")
                }
                RegistrationError::DuplicateRegistration { .. } => {
                    (StatusCode::CONFLICT, "duplicate_registration")
                }
                RegistrationError::CapacityExceeded { .. } => {
                    (StatusCode::CONFLICT, "capacity_exceeded")
                }
                RegistrationError::TransientConflict(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "transient_conflict")
                }
                RegistrationError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            },
            AppError::Availability(e) => match e {
                AvailabilityError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                AvailabilityError::InvalidWindow { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_window")
                }
                AvailabilityError::Overlap { .. } => (StatusCode::CONFLICT, "overlap"),
                AvailabilityError::TransientConflict(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "transient_conflict")
                }
                AvailabilityError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            },
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(error = %self, kind, "request failed");
        }

        let mut body = serde_json::json!({ "error": self.to_string(), "kind": kind });
        match &self {
            AppError::Booking(BookingError::Unavailable { availability, .. }) => {
                body["availability"] = serde_json::json!(availability);
                body["hours"] = serde_json::json!(to_human_readable(availability));
            }
            AppError::Booking(BookingError::Conflict { subject, existing }) => {
                body["subject"] = serde_json::json!(subject);
                body["existing"] = serde_json::json!(existing);
            }
            _ => {}
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_transient() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        assert!(matches!(
            RegistrationError::from(busy),
            RegistrationError::TransientConflict(_)
        ));
    }

    #[test]
    fn test_other_sqlite_errors_are_not_transient() {
        let err = BookingError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, BookingError::Database(_)));
    }

    #[test]
    fn test_constraint_violation_detection() {
        let unique = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            None,
        );
        assert!(is_unique_violation(&unique));
        assert!(!is_unique_violation(&rusqlite::Error::QueryReturnedNoRows));

        let fk = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            None,
        );
        assert!(is_foreign_key_violation(&fk));
        assert!(!is_unique_violation(&fk));
        assert!(!is_foreign_key_violation(&unique));
    }

    #[test]
    fn test_status_codes() {
        let not_found = AppError::from(BookingError::NotFound {
            kind: EntityKind::Room,
            id: 7,
        });
        assert_eq!(not_found.status_and_kind().0, StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "room 7 not found");

        let full = AppError::from(RegistrationError::CapacityExceeded {
            requested: 16,
            max: 15,
        });
        assert_eq!(full.status_and_kind(), (StatusCode::CONFLICT, "capacity_exceeded"));

        let retry = AppError::from(RegistrationError::TransientConflict("busy".into()));
        assert_eq!(retry.status_and_kind().0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
