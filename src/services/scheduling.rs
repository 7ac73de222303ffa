use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;

use crate::db::queries::{self, NewGroupClass, NewSession};
use crate::errors::{
    is_foreign_key_violation, BookingError, ConflictingBooking, EntityKind, Subject,
};
use crate::models::{GroupClass, PtSession, Room, Span, TimeWindow, Trainer};
use crate::services::{availability, conflict};

#[derive(Debug, Clone, Deserialize)]
pub struct SessionRequest {
    pub member_id: i64,
    pub trainer_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassRequest {
    #[serde(default)]
    pub admin_id: Option<i64>,
    pub trainer_id: i64,
    pub room_id: i64,
    pub title: String,
    pub capacity: i64,
    pub schedule_time: NaiveDateTime,
    pub duration_minutes: i64,
    #[serde(default)]
    pub description: Option<String>,
}

fn require_trainer(tx: &Transaction, id: i64) -> Result<Trainer, BookingError> {
    queries::get_trainer(tx, id)?.ok_or(BookingError::NotFound {
        kind: EntityKind::Trainer,
        id,
    })
}

fn require_room(tx: &Transaction, id: i64) -> Result<Room, BookingError> {
    queries::get_room(tx, id)?.ok_or(BookingError::NotFound {
        kind: EntityKind::Room,
        id,
    })
}

fn ensure_free(
    tx: &Transaction,
    subject: Subject,
    subject_id: i64,
    window: &TimeWindow,
) -> Result<(), BookingError> {
    match conflict::detect(tx, subject, subject_id, window)? {
        Some(existing) => Err(BookingError::Conflict {
            subject,
            existing: Box::new(ConflictingBooking::Session(existing)),
        }),
        None => Ok(()),
    }
}

fn ensure_available(tx: &Transaction, trainer_id: i64, window: &TimeWindow) -> Result<(), BookingError> {
    let entries = queries::list_availability(tx, trainer_id)?;
    if availability::covering_entry(&entries, window).is_some() {
        return Ok(());
    }
    Err(BookingError::Unavailable {
        trainer_id,
        requested: *window,
        availability: entries,
    })
}

fn ensure_room_fits(room: &Room, capacity: i64) -> Result<(), BookingError> {
    if capacity > room.capacity {
        return Err(BookingError::CapacityExceeded {
            requested: capacity,
            max: room.capacity,
        });
    }
    Ok(())
}

fn ensure_room_clear(tx: &Transaction, room_id: i64, span: &Span) -> Result<(), BookingError> {
    let classes = queries::classes_in_room(tx, room_id)?;
    match conflict::find_class_conflict(&classes, span) {
        Some(existing) => Err(BookingError::Conflict {
            subject: Subject::Room,
            existing: Box::new(ConflictingBooking::Class(existing.clone())),
        }),
        None => Ok(()),
    }
}

/// Members are not looked up ahead of the insert; a foreign-key failure on an
/// id with no member row is reported as that member being missing.
fn session_insert_error(tx: &Transaction, member_id: i64, e: rusqlite::Error) -> BookingError {
    if is_foreign_key_violation(&e) {
        if let Ok(None) = queries::get_member(tx, member_id) {
            return BookingError::NotFound {
                kind: EntityKind::Member,
                id: member_id,
            };
        }
    }
    BookingError::from(e)
}

fn log_rejection(operation: &str, err: &BookingError) {
    match err {
        BookingError::TransientConflict(_) => tracing::warn!(operation, error = %err, "lost write race"),
        BookingError::Database(_) => {}
        _ => tracing::debug!(operation, error = %err, "rejected"),
    }
}

/// Book a PT session. Checks run in a fixed order and the first failure is
/// returned; the checks and the insert share one write transaction, so a
/// competing booking cannot land between them.
pub fn schedule_session(conn: &mut Connection, req: &SessionRequest) -> Result<PtSession, BookingError> {
    let result = try_schedule_session(conn, req);
    match &result {
        Ok(session) => tracing::info!(
            session_id = session.id,
            member_id = session.member_id,
            trainer_id = session.trainer_id,
            room_id = session.room_id,
            date = %session.date,
            "session scheduled"
        ),
        Err(e) => log_rejection("schedule_session", e),
    }
    result
}

fn try_schedule_session(conn: &mut Connection, req: &SessionRequest) -> Result<PtSession, BookingError> {
    let window = TimeWindow::on_date(req.date, req.start, req.end)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    require_trainer(&tx, req.trainer_id)?;
    require_room(&tx, req.room_id)?;
    ensure_free(&tx, Subject::Member, req.member_id, &window)?;
    ensure_free(&tx, Subject::Trainer, req.trainer_id, &window)?;
    ensure_free(&tx, Subject::Room, req.room_id, &window)?;
    ensure_available(&tx, req.trainer_id, &window)?;

    let session = queries::insert_session(
        &tx,
        &NewSession {
            member_id: req.member_id,
            trainer_id: req.trainer_id,
            room_id: req.room_id,
            date: req.date,
            start: window.start,
            end: window.end,
            notes: req.notes.as_deref(),
        },
    )
    .map_err(|e| session_insert_error(&tx, req.member_id, e))?;
    tx.commit()?;
    Ok(session)
}

/// Create a group class in a room. Trainer availability is not consulted.
pub fn create_group_class(conn: &mut Connection, req: &ClassRequest) -> Result<GroupClass, BookingError> {
    let result = try_create_group_class(conn, req);
    match &result {
        Ok(class) => tracing::info!(
            class_id = class.id,
            trainer_id = class.trainer_id,
            room_id = class.room_id,
            capacity = class.capacity,
            "group class created"
        ),
        Err(e) => log_rejection("create_group_class", e),
    }
    result
}

fn try_create_group_class(conn: &mut Connection, req: &ClassRequest) -> Result<GroupClass, BookingError> {
    if req.capacity < 1 {
        return Err(BookingError::InvalidCapacity(req.capacity));
    }
    let span = Span::from_duration(req.schedule_time, req.duration_minutes)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    require_trainer(&tx, req.trainer_id)?;
    let room = require_room(&tx, req.room_id)?;
    ensure_room_fits(&room, req.capacity)?;
    ensure_room_clear(&tx, room.id, &span)?;

    let class = queries::insert_group_class(
        &tx,
        &NewGroupClass {
            admin_id: req.admin_id,
            trainer_id: req.trainer_id,
            room_id: req.room_id,
            title: &req.title,
            description: req.description.as_deref(),
            schedule_time: span.start,
            duration_minutes: req.duration_minutes,
            capacity: req.capacity,
        },
    )?;
    tx.commit()?;
    Ok(class)
}
