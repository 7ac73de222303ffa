use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::Subject;
use crate::models::time_window::weekday_name;
use crate::models::{
    Admin, Availability, AvailabilityKind, ClassRegistration, GroupClass, Member, NewUser,
    PtSession, RegistrationStatus, Room, SessionStatus, Trainer,
};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub fn fmt_time(t: &NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

pub fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn conversion_err(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn date_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT).map_err(|e| conversion_err(idx, e))
}

fn time_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FMT).map_err(|e| conversion_err(idx, e))
}

fn datetime_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FMT).map_err(|e| conversion_err(idx, e))
}

// ── Users ──

pub fn insert_member(conn: &Connection, user: &NewUser) -> rusqlite::Result<Member> {
    conn.execute(
        "INSERT INTO members (first_name, last_name, email) VALUES (?1, ?2, ?3)",
        params![user.first_name, user.last_name, user.email],
    )?;
    Ok(Member {
        id: conn.last_insert_rowid(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    })
}

pub fn insert_trainer(conn: &Connection, user: &NewUser) -> rusqlite::Result<Trainer> {
    conn.execute(
        "INSERT INTO trainers (first_name, last_name, email) VALUES (?1, ?2, ?3)",
        params![user.first_name, user.last_name, user.email],
    )?;
    Ok(Trainer {
        id: conn.last_insert_rowid(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    })
}

pub fn insert_admin(conn: &Connection, user: &NewUser) -> rusqlite::Result<Admin> {
    conn.execute(
        "INSERT INTO admins (first_name, last_name, email) VALUES (?1, ?2, ?3)",
        params![user.first_name, user.last_name, user.email],
    )?;
    Ok(Admin {
        id: conn.last_insert_rowid(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    })
}

pub fn get_member(conn: &Connection, id: i64) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        "SELECT member_id, first_name, last_name, email FROM members WHERE member_id = ?1",
        params![id],
        |row| {
            Ok(Member {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn get_trainer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Trainer>> {
    conn.query_row(
        "SELECT trainer_id, first_name, last_name, email FROM trainers WHERE trainer_id = ?1",
        params![id],
        |row| {
            Ok(Trainer {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
            })
        },
    )
    .optional()
}

// ── Rooms ──

pub fn insert_room(
    conn: &Connection,
    admin_id: Option<i64>,
    name: &str,
    capacity: i64,
) -> rusqlite::Result<Room> {
    conn.execute(
        "INSERT INTO rooms (room_name, capacity, admin_id) VALUES (?1, ?2, ?3)",
        params![name, capacity, admin_id],
    )?;
    Ok(Room {
        id: conn.last_insert_rowid(),
        admin_id,
        name: name.to_string(),
        capacity,
    })
}

pub fn get_room(conn: &Connection, id: i64) -> rusqlite::Result<Option<Room>> {
    conn.query_row(
        "SELECT room_id, admin_id, room_name, capacity FROM rooms WHERE room_id = ?1",
        params![id],
        parse_room_row,
    )
    .optional()
}

pub fn list_rooms(conn: &Connection) -> rusqlite::Result<Vec<Room>> {
    let mut stmt =
        conn.prepare("SELECT room_id, admin_id, room_name, capacity FROM rooms ORDER BY room_id ASC")?;
    let rows = stmt.query_map([], parse_room_row)?;
    rows.collect()
}

fn parse_room_row(row: &Row) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        admin_id: row.get(1)?,
        name: row.get(2)?,
        capacity: row.get(3)?,
    })
}

// ── Availability ──

pub fn list_availability(conn: &Connection, trainer_id: i64) -> rusqlite::Result<Vec<Availability>> {
    let mut stmt = conn.prepare(
        "SELECT availability_id, trainer_id, start_time, end_time, is_recurring, day_of_week, specific_date
         FROM availabilities WHERE trainer_id = ?1 ORDER BY availability_id ASC",
    )?;

    let rows = stmt.query_map(params![trainer_id], parse_availability_row)?;
    rows.collect()
}

pub fn insert_availability(
    conn: &Connection,
    trainer_id: i64,
    kind: &AvailabilityKind,
    start: &NaiveTime,
    end: &NaiveTime,
) -> rusqlite::Result<Availability> {
    let (day_of_week, specific_date) = match kind {
        AvailabilityKind::Recurring(w) => (Some(weekday_name::to_str(*w)), None),
        AvailabilityKind::SingleDate(d) => (None, Some(fmt_date(d))),
    };

    conn.execute(
        "INSERT INTO availabilities (trainer_id, start_time, end_time, is_recurring, day_of_week, specific_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            trainer_id,
            fmt_time(start),
            fmt_time(end),
            kind.is_recurring(),
            day_of_week,
            specific_date,
        ],
    )?;

    Ok(Availability {
        id: conn.last_insert_rowid(),
        trainer_id,
        kind: *kind,
        start: *start,
        end: *end,
    })
}

fn parse_availability_row(row: &Row) -> rusqlite::Result<Availability> {
    let is_recurring: bool = row.get(4)?;
    let kind = if is_recurring {
        let raw: String = row.get(5)?;
        let weekday = weekday_name::parse(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("invalid weekday: {raw}").into(),
            )
        })?;
        AvailabilityKind::Recurring(weekday)
    } else {
        AvailabilityKind::SingleDate(date_col(row, 6)?)
    };

    Ok(Availability {
        id: row.get(0)?,
        trainer_id: row.get(1)?,
        kind,
        start: time_col(row, 2)?,
        end: time_col(row, 3)?,
    })
}

// ── PT Sessions ──

const SESSION_COLUMNS: &str =
    "session_id, member_id, trainer_id, room_id, date, start_time, end_time, status, notes";

pub struct NewSession<'a> {
    pub member_id: i64,
    pub trainer_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub notes: Option<&'a str>,
}

pub fn insert_session(conn: &Connection, session: &NewSession) -> rusqlite::Result<PtSession> {
    let status = SessionStatus::Scheduled;
    conn.execute(
        "INSERT INTO pt_sessions (member_id, trainer_id, room_id, date, start_time, end_time, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            session.member_id,
            session.trainer_id,
            session.room_id,
            fmt_date(&session.date),
            fmt_time(&session.start),
            fmt_time(&session.end),
            status.as_str(),
            session.notes,
        ],
    )?;

    Ok(PtSession {
        id: conn.last_insert_rowid(),
        member_id: session.member_id,
        trainer_id: session.trainer_id,
        room_id: session.room_id,
        date: session.date,
        start: session.start,
        end: session.end,
        status,
        notes: session.notes.map(str::to_string),
    })
}

/// Every session on `date` whose `subject` column equals `subject_id`,
/// cancelled ones included; callers decide what counts.
pub fn sessions_by_date_and_subject(
    conn: &Connection,
    subject: Subject,
    subject_id: i64,
    date: &NaiveDate,
) -> rusqlite::Result<Vec<PtSession>> {
    let column = match subject {
        Subject::Member => "member_id",
        Subject::Trainer => "trainer_id",
        Subject::Room => "room_id",
    };
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM pt_sessions WHERE {column} = ?1 AND date = ?2 ORDER BY start_time ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![subject_id, fmt_date(date)], parse_session_row)?;
    rows.collect()
}

pub fn upcoming_sessions_for_trainer(
    conn: &Connection,
    trainer_id: i64,
    from: &NaiveDate,
) -> rusqlite::Result<Vec<PtSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM pt_sessions
         WHERE trainer_id = ?1 AND date >= ?2 AND status != 'cancelled'
         ORDER BY date ASC, start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![trainer_id, fmt_date(from)], parse_session_row)?;
    rows.collect()
}

fn parse_session_row(row: &Row) -> rusqlite::Result<PtSession> {
    let status: String = row.get(7)?;
    Ok(PtSession {
        id: row.get(0)?,
        member_id: row.get(1)?,
        trainer_id: row.get(2)?,
        room_id: row.get(3)?,
        date: date_col(row, 4)?,
        start: time_col(row, 5)?,
        end: time_col(row, 6)?,
        status: SessionStatus::parse(&status),
        notes: row.get(8)?,
    })
}

// ── Group Classes ──

const CLASS_COLUMNS: &str =
    "class_id, admin_id, trainer_id, room_id, title, description, schedule_time, duration_minutes, capacity";

pub struct NewGroupClass<'a> {
    pub admin_id: Option<i64>,
    pub trainer_id: i64,
    pub room_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub schedule_time: NaiveDateTime,
    pub duration_minutes: i64,
    pub capacity: i64,
}

pub fn insert_group_class(conn: &Connection, class: &NewGroupClass) -> rusqlite::Result<GroupClass> {
    conn.execute(
        "INSERT INTO group_classes (admin_id, trainer_id, room_id, title, description, schedule_time, duration_minutes, capacity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            class.admin_id,
            class.trainer_id,
            class.room_id,
            class.title,
            class.description,
            fmt_datetime(&class.schedule_time),
            class.duration_minutes,
            class.capacity,
        ],
    )?;

    Ok(GroupClass {
        id: conn.last_insert_rowid(),
        admin_id: class.admin_id,
        trainer_id: class.trainer_id,
        room_id: class.room_id,
        title: class.title.to_string(),
        description: class.description.map(str::to_string),
        schedule_time: class.schedule_time,
        duration_minutes: class.duration_minutes,
        capacity: class.capacity,
    })
}

pub fn get_group_class(conn: &Connection, id: i64) -> rusqlite::Result<Option<GroupClass>> {
    let sql = format!("SELECT {CLASS_COLUMNS} FROM group_classes WHERE class_id = ?1");
    conn.query_row(&sql, params![id], parse_class_row).optional()
}

pub fn classes_in_room(conn: &Connection, room_id: i64) -> rusqlite::Result<Vec<GroupClass>> {
    let sql = format!(
        "SELECT {CLASS_COLUMNS} FROM group_classes WHERE room_id = ?1 ORDER BY schedule_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![room_id], parse_class_row)?;
    rows.collect()
}

pub fn upcoming_classes_for_trainer(
    conn: &Connection,
    trainer_id: i64,
    from: &NaiveDateTime,
) -> rusqlite::Result<Vec<GroupClass>> {
    let sql = format!(
        "SELECT {CLASS_COLUMNS} FROM group_classes
         WHERE trainer_id = ?1 AND schedule_time >= ?2 ORDER BY schedule_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![trainer_id, fmt_datetime(from)], parse_class_row)?;
    rows.collect()
}

/// Classes starting at or after `from`, across all trainers and rooms.
pub fn upcoming_classes(conn: &Connection, from: &NaiveDateTime) -> rusqlite::Result<Vec<GroupClass>> {
    let sql = format!(
        "SELECT {CLASS_COLUMNS} FROM group_classes
         WHERE schedule_time >= ?1 ORDER BY schedule_time ASC, class_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![fmt_datetime(from)], parse_class_row)?;
    rows.collect()
}

fn parse_class_row(row: &Row) -> rusqlite::Result<GroupClass> {
    Ok(GroupClass {
        id: row.get(0)?,
        admin_id: row.get(1)?,
        trainer_id: row.get(2)?,
        room_id: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        schedule_time: datetime_col(row, 6)?,
        duration_minutes: row.get(7)?,
        capacity: row.get(8)?,
    })
}

// ── Class Registrations ──

pub fn count_active_registrations(conn: &Connection, class_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM class_registrations WHERE class_id = ?1 AND status = 'registered'",
        params![class_id],
        |row| row.get(0),
    )
}

pub fn is_registered(conn: &Connection, member_id: i64, class_id: i64) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM class_registrations
         WHERE member_id = ?1 AND class_id = ?2 AND status = 'registered'",
        params![member_id, class_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert_registration(
    conn: &Connection,
    member_id: i64,
    class_id: i64,
    registered_at: &NaiveDateTime,
) -> rusqlite::Result<ClassRegistration> {
    let status = RegistrationStatus::Registered;
    conn.execute(
        "INSERT INTO class_registrations (member_id, class_id, registration_date, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![member_id, class_id, fmt_datetime(registered_at), status.as_str()],
    )?;

    Ok(ClassRegistration {
        id: conn.last_insert_rowid(),
        member_id,
        class_id,
        registration_date: *registered_at,
        status,
    })
}

pub fn registrations_for_class(
    conn: &Connection,
    class_id: i64,
) -> rusqlite::Result<Vec<ClassRegistration>> {
    let mut stmt = conn.prepare(
        "SELECT registration_id, member_id, class_id, registration_date, status
         FROM class_registrations WHERE class_id = ?1 ORDER BY registration_id ASC",
    )?;
    let rows = stmt.query_map(params![class_id], |row| {
        let status: String = row.get(4)?;
        Ok(ClassRegistration {
            id: row.get(0)?,
            member_id: row.get(1)?,
            class_id: row.get(2)?,
            registration_date: datetime_col(row, 3)?,
            status: RegistrationStatus::parse(&status),
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Weekday;

    fn setup_db() -> Connection {
        db::init_db(":memory:", db::DEFAULT_BUSY_TIMEOUT_MS).unwrap()
    }

    fn user(email: &str) -> NewUser {
        NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
        }
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_missing_entities_are_none() {
        let conn = setup_db();
        assert!(get_trainer(&conn, 42).unwrap().is_none());
        assert!(get_room(&conn, 42).unwrap().is_none());
        assert!(get_member(&conn, 42).unwrap().is_none());
        assert!(get_group_class(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_availability_round_trip_both_kinds() {
        let conn = setup_db();
        let trainer = insert_trainer(&conn, &user("zack@gym.com")).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();

        insert_availability(
            &conn,
            trainer.id,
            &AvailabilityKind::Recurring(Weekday::Mon),
            &t("08:00"),
            &t("12:00"),
        )
        .unwrap();
        insert_availability(
            &conn,
            trainer.id,
            &AvailabilityKind::SingleDate(date),
            &t("13:00"),
            &t("15:30"),
        )
        .unwrap();

        let entries = list_availability(&conn, trainer.id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, AvailabilityKind::Recurring(Weekday::Mon));
        assert_eq!(entries[0].start, t("08:00"));
        assert_eq!(entries[1].kind, AvailabilityKind::SingleDate(date));
        assert_eq!(entries[1].end, t("15:30"));
    }

    #[test]
    fn test_sessions_filtered_by_subject_and_date() {
        let conn = setup_db();
        let m1 = insert_member(&conn, &user("chris@email.com")).unwrap();
        let m2 = insert_member(&conn, &user("tom@email.com")).unwrap();
        let trainer = insert_trainer(&conn, &user("bao@gym.com")).unwrap();
        let room = insert_room(&conn, None, "PT Room A", 5).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let next_day = day.succ_opt().unwrap();

        for (member_id, date) in [(m1.id, day), (m2.id, day), (m1.id, next_day)] {
            insert_session(
                &conn,
                &NewSession {
                    member_id,
                    trainer_id: trainer.id,
                    room_id: room.id,
                    date,
                    start: t("10:00"),
                    end: t("11:00"),
                    notes: None,
                },
            )
            .unwrap();
        }

        let member_day = sessions_by_date_and_subject(&conn, Subject::Member, m1.id, &day).unwrap();
        assert_eq!(member_day.len(), 1);
        assert_eq!(member_day[0].status, SessionStatus::Scheduled);

        let trainer_day =
            sessions_by_date_and_subject(&conn, Subject::Trainer, trainer.id, &day).unwrap();
        assert_eq!(trainer_day.len(), 2);

        let room_next = sessions_by_date_and_subject(&conn, Subject::Room, room.id, &next_day).unwrap();
        assert_eq!(room_next.len(), 1);
        assert_eq!(room_next[0].member_id, m1.id);
    }

    #[test]
    fn test_registration_partial_unique_index() {
        let conn = setup_db();
        let member = insert_member(&conn, &user("sarah@email.com")).unwrap();
        let trainer = insert_trainer(&conn, &user("emily@gym.com")).unwrap();
        let room = insert_room(&conn, None, "Yoga Studio", 20).unwrap();
        let when = NaiveDateTime::parse_from_str("2030-01-07 18:00:00", DATETIME_FMT).unwrap();
        let class = insert_group_class(
            &conn,
            &NewGroupClass {
                admin_id: None,
                trainer_id: trainer.id,
                room_id: room.id,
                title: "Evening Flow",
                description: None,
                schedule_time: when,
                duration_minutes: 60,
                capacity: 10,
            },
        )
        .unwrap();

        insert_registration(&conn, member.id, class.id, &when).unwrap();
        let dup = insert_registration(&conn, member.id, class.id, &when);
        assert!(dup.is_err());
        assert!(crate::errors::is_unique_violation(&dup.unwrap_err()));
        assert_eq!(count_active_registrations(&conn, class.id).unwrap(), 1);
        assert!(is_registered(&conn, member.id, class.id).unwrap());
    }

    #[test]
    fn test_listings_are_ordered() {
        let conn = setup_db();
        let trainer = insert_trainer(&conn, &user("emily@gym.com")).unwrap();
        let big = insert_room(&conn, None, "Main Hall", 30).unwrap();
        let small = insert_room(&conn, None, "PT Room A", 2).unwrap();
        assert_eq!(list_rooms(&conn).unwrap(), vec![big.clone(), small]);

        let at = |s: &str| NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap();
        let class_at = |when: &str| {
            insert_group_class(
                &conn,
                &NewGroupClass {
                    admin_id: None,
                    trainer_id: trainer.id,
                    room_id: big.id,
                    title: "Spin",
                    description: None,
                    schedule_time: at(when),
                    duration_minutes: 45,
                    capacity: 20,
                },
            )
            .unwrap()
        };
        let later = class_at("2030-01-09 18:00:00");
        class_at("2029-12-31 18:00:00");
        let sooner = class_at("2030-01-08 07:00:00");

        let upcoming = upcoming_classes(&conn, &at("2030-01-01 00:00:00")).unwrap();
        assert_eq!(upcoming, vec![sooner, later]);
    }
}
