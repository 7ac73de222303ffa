use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::{AvailabilityError, EntityKind};
use crate::models::{Availability, AvailabilityKind, TimeWindow};

/// The first entry whose window fully contains `requested`. Single-date and
/// recurring entries are searched alike; covering does not depend on the source.
pub fn covering_entry<'a>(entries: &'a [Availability], requested: &TimeWindow) -> Option<&'a Availability> {
    entries
        .iter()
        .find(|a| a.window().is_ok_and(|w| w.covers(requested)))
}

/// Whether the trainer declared availability covering `[start, end)` on `date`.
/// A trainer with no entries is never available.
pub fn is_available(
    conn: &Connection,
    trainer_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> rusqlite::Result<bool> {
    let Ok(requested) = TimeWindow::on_date(date, start, end) else {
        return Ok(false);
    };
    let entries = queries::list_availability(conn, trainer_id)?;
    Ok(covering_entry(&entries, &requested).is_some())
}

/// Declare a new availability block, rejecting any overlap with an existing
/// entry for the same weekday (recurring) or the same date (single-date).
pub fn set_availability(
    conn: &mut Connection,
    trainer_id: i64,
    start: NaiveTime,
    end: NaiveTime,
    kind: AvailabilityKind,
) -> Result<Availability, AvailabilityError> {
    let window = TimeWindow::new(kind.day(), start, end)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if queries::get_trainer(&tx, trainer_id)?.is_none() {
        return Err(AvailabilityError::NotFound {
            kind: EntityKind::Trainer,
            id: trainer_id,
        });
    }

    let existing = queries::list_availability(&tx, trainer_id)?;
    let clash = existing
        .iter()
        .filter(|a| a.kind == kind)
        .find(|a| a.window().is_ok_and(|w| w.overlaps(&window)));
    if let Some(clash) = clash {
        tracing::debug!(trainer_id, existing = clash.id, "availability overlaps existing entry");
        return Err(AvailabilityError::Overlap {
            existing_window: clash
                .window()
                .map(|w| w.to_string())
                .unwrap_or_default(),
            existing: Box::new(clash.clone()),
        });
    }

    let entry = queries::insert_availability(&tx, trainer_id, &kind, &window.start, &window.end)?;
    tx.commit()?;

    tracing::info!(trainer_id, availability_id = entry.id, window = %window, "availability set");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::NewUser;
    use chrono::Weekday;

    fn setup_db() -> Connection {
        db::init_db(":memory:", db::DEFAULT_BUSY_TIMEOUT_MS).unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn add_trainer(conn: &Connection) -> i64 {
        queries::insert_trainer(
            conn,
            &NewUser {
                first_name: "Zack".to_string(),
                last_name: "Nguyen".to_string(),
                email: "zack@gym.com".to_string(),
            },
        )
        .unwrap()
        .id
    }

    const MONDAY: AvailabilityKind = AvailabilityKind::Recurring(Weekday::Mon);

    #[test]
    fn test_no_entries_is_never_available() {
        let conn = setup_db();
        let trainer = add_trainer(&conn);
        assert!(!is_available(&conn, trainer, d("2025-06-16"), t("09:00"), t("10:00")).unwrap());
    }

    #[test]
    fn test_recurring_entry_covers_request() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        set_availability(&mut conn, trainer, t("08:00"), t("12:00"), MONDAY).unwrap();

        // 2025-06-16 is a Monday
        assert!(is_available(&conn, trainer, d("2025-06-16"), t("09:00"), t("10:00")).unwrap());
        assert!(is_available(&conn, trainer, d("2025-06-16"), t("08:00"), t("12:00")).unwrap());
        // overlapping but not covered
        assert!(!is_available(&conn, trainer, d("2025-06-16"), t("07:00"), t("09:30")).unwrap());
        assert!(!is_available(&conn, trainer, d("2025-06-16"), t("11:30"), t("12:30")).unwrap());
        // Tuesday
        assert!(!is_available(&conn, trainer, d("2025-06-17"), t("09:00"), t("10:00")).unwrap());
    }

    #[test]
    fn test_single_date_entry_covers_only_that_date() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        let kind = AvailabilityKind::SingleDate(d("2025-06-18"));
        set_availability(&mut conn, trainer, t("13:00"), t("17:00"), kind).unwrap();

        assert!(is_available(&conn, trainer, d("2025-06-18"), t("14:00"), t("15:00")).unwrap());
        assert!(!is_available(&conn, trainer, d("2025-06-25"), t("14:00"), t("15:00")).unwrap());
    }

    #[test]
    fn test_request_must_fit_inside_one_entry() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        set_availability(&mut conn, trainer, t("08:00"), t("10:00"), MONDAY).unwrap();
        set_availability(&mut conn, trainer, t("10:00"), t("12:00"), MONDAY).unwrap();

        // straddles two adjacent blocks; neither covers it alone
        assert!(!is_available(&conn, trainer, d("2025-06-16"), t("09:30"), t("10:30")).unwrap());
    }

    #[test]
    fn test_inverted_request_is_not_available() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        set_availability(&mut conn, trainer, t("08:00"), t("12:00"), MONDAY).unwrap();
        assert!(!is_available(&conn, trainer, d("2025-06-16"), t("10:00"), t("09:00")).unwrap());
    }

    #[test]
    fn test_overlapping_recurring_entry_rejected() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        let first = set_availability(&mut conn, trainer, t("08:00"), t("12:00"), MONDAY).unwrap();

        let err = set_availability(&mut conn, trainer, t("10:00"), t("14:00"), MONDAY).unwrap_err();
        match err {
            AvailabilityError::Overlap { existing, .. } => assert_eq!(existing.id, first.id),
            other => panic!("expected overlap, got {other:?}"),
        }

        // touching is fine
        assert!(set_availability(&mut conn, trainer, t("12:00"), t("14:00"), MONDAY).is_ok());
        assert_eq!(queries::list_availability(&conn, trainer).unwrap().len(), 2);
    }

    #[test]
    fn test_different_weekday_or_kind_does_not_clash() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        set_availability(&mut conn, trainer, t("08:00"), t("12:00"), MONDAY).unwrap();

        let tuesday = AvailabilityKind::Recurring(Weekday::Tue);
        assert!(set_availability(&mut conn, trainer, t("08:00"), t("12:00"), tuesday).is_ok());

        // a Monday date supplements the recurring Monday entry
        let monday_date = AvailabilityKind::SingleDate(d("2025-06-16"));
        assert!(set_availability(&mut conn, trainer, t("09:00"), t("13:00"), monday_date).is_ok());
    }

    #[test]
    fn test_overlapping_single_date_entry_rejected() {
        let mut conn = setup_db();
        let trainer = add_trainer(&conn);
        let kind = AvailabilityKind::SingleDate(d("2025-06-18"));
        set_availability(&mut conn, trainer, t("13:00"), t("17:00"), kind).unwrap();

        let err = set_availability(&mut conn, trainer, t("16:00"), t("18:00"), kind).unwrap_err();
        assert!(matches!(err, AvailabilityError::Overlap { .. }));
    }

    #[test]
    fn test_unknown_trainer() {
        let mut conn = setup_db();
        let err = set_availability(&mut conn, 99, t("08:00"), t("12:00"), MONDAY).unwrap_err();
        assert!(matches!(
            err,
            AvailabilityError::NotFound {
                kind: EntityKind::Trainer,
                id: 99
            }
        ));
    }

    #[test]
    fn test_invalid_window_rejected_before_lookup() {
        let mut conn = setup_db();
        let err = set_availability(&mut conn, 99, t("12:00"), t("08:00"), MONDAY).unwrap_err();
        assert!(matches!(err, AvailabilityError::InvalidWindow { .. }));
    }
}
