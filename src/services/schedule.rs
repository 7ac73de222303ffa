//! Read-only view of a trainer's upcoming week: booked sessions, classes with
//! their enrolment, and declared availability.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::{BookingError, EntityKind};
use crate::models::{Availability, GroupClass, PtSession, Trainer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEnrolment {
    #[serde(flatten)]
    pub class: GroupClass,
    pub enrolled: i64,
}

impl ClassEnrolment {
    pub fn seats_left(&self) -> i64 {
        (self.class.capacity - self.enrolled).max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainerSchedule {
    pub trainer: Trainer,
    pub sessions: Vec<PtSession>,
    pub classes: Vec<ClassEnrolment>,
    pub availability: Vec<Availability>,
}

fn with_enrolment(conn: &Connection, classes: Vec<GroupClass>) -> rusqlite::Result<Vec<ClassEnrolment>> {
    classes
        .into_iter()
        .map(|class| {
            let enrolled = queries::count_active_registrations(conn, class.id)?;
            Ok(ClassEnrolment { class, enrolled })
        })
        .collect()
}

/// Every class starting at or after `now`, soonest first.
pub fn upcoming_classes(conn: &Connection, now: NaiveDateTime) -> rusqlite::Result<Vec<ClassEnrolment>> {
    with_enrolment(conn, queries::upcoming_classes(conn, &now)?)
}

pub fn trainer_schedule(
    conn: &Connection,
    trainer_id: i64,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<TrainerSchedule, BookingError> {
    let trainer = queries::get_trainer(conn, trainer_id)?.ok_or(BookingError::NotFound {
        kind: EntityKind::Trainer,
        id: trainer_id,
    })?;

    let sessions = queries::upcoming_sessions_for_trainer(conn, trainer_id, &today)?;
    let classes = with_enrolment(
        conn,
        queries::upcoming_classes_for_trainer(conn, trainer_id, &now)?,
    )?;
    let availability = queries::list_availability(conn, trainer_id)?;

    Ok(TrainerSchedule {
        trainer,
        sessions,
        classes,
        availability,
    })
}
