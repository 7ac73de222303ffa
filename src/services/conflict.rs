//! Overlap scans against existing bookings.
//!
//! PT sessions are checked per subject (member, trainer, room) on the session's
//! date; group classes are checked per room on their timestamp spans. Both use
//! the half-open rule, so back-to-back bookings never conflict.

use rusqlite::Connection;

use crate::db::queries;
use crate::errors::Subject;
use crate::models::{GroupClass, PtSession, Span, TimeWindow};

fn subject_id_of(session: &PtSession, subject: Subject) -> i64 {
    match subject {
        Subject::Member => session.member_id,
        Subject::Trainer => session.trainer_id,
        Subject::Room => session.room_id,
    }
}

/// First active session for `subject_id` that overlaps `window`.
pub fn find_conflict<'a>(
    existing: &'a [PtSession],
    subject: Subject,
    subject_id: i64,
    window: &TimeWindow,
) -> Option<&'a PtSession> {
    existing
        .iter()
        .filter(|s| s.is_active() && subject_id_of(s, subject) == subject_id)
        .find(|s| s.window().is_ok_and(|w| w.overlaps(window)))
}

/// Load the subject's sessions for the window's date and scan them.
/// Recurring windows have no date to query, so they never conflict here.
pub fn detect(
    conn: &Connection,
    subject: Subject,
    subject_id: i64,
    window: &TimeWindow,
) -> rusqlite::Result<Option<PtSession>> {
    let Some(date) = window.date() else {
        return Ok(None);
    };
    let sessions = queries::sessions_by_date_and_subject(conn, subject, subject_id, &date)?;
    Ok(find_conflict(&sessions, subject, subject_id, window).cloned())
}

pub fn find_class_conflict<'a>(existing: &'a [GroupClass], span: &Span) -> Option<&'a GroupClass> {
    existing
        .iter()
        .find(|c| c.span().is_ok_and(|s| s.overlaps(span)))
}
