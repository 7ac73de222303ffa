use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::{
    is_foreign_key_violation, is_unique_violation, EntityKind, RegistrationError,
};
use crate::models::ClassRegistration;

/// Register a member for a group class.
///
/// The seat count and the insert run under one `BEGIN IMMEDIATE`, which takes
/// SQLite's write lock up front: a second registration for the same class waits
/// (up to the busy timeout) and then sees the first one's row in its count.
/// A partial unique index on active registrations backs the duplicate check.
pub fn register_for_class(
    conn: &mut Connection,
    member_id: i64,
    class_id: i64,
    now: NaiveDateTime,
) -> Result<ClassRegistration, RegistrationError> {
    let result = try_register(conn, member_id, class_id, now);
    match &result {
        Ok(reg) => tracing::info!(
            registration_id = reg.id,
            member_id,
            class_id,
            "member registered for class"
        ),
        Err(RegistrationError::TransientConflict(e)) => {
            tracing::warn!(member_id, class_id, error = %e, "registration lost write race")
        }
        Err(RegistrationError::Database(_)) => {}
        Err(e) => tracing::debug!(member_id, class_id, error = %e, "registration rejected"),
    }
    result
}

fn try_register(
    conn: &mut Connection,
    member_id: i64,
    class_id: i64,
    now: NaiveDateTime,
) -> Result<ClassRegistration, RegistrationError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let class = queries::get_group_class(&tx, class_id)?.ok_or(RegistrationError::NotFound {
        kind: EntityKind::GroupClass,
        id: class_id,
    })?;

    if class.schedule_time <= now {
        return Err(RegistrationError::PastDeadline {
            class_id,
            schedule_time: class.schedule_time,
        });
    }

    if queries::is_registered(&tx, member_id, class_id)? {
        return Err(RegistrationError::DuplicateRegistration {
            member_id,
            class_id,
        });
    }

    let count = queries::count_active_registrations(&tx, class_id)?;
    if count >= class.capacity {
        return Err(RegistrationError::CapacityExceeded {
            requested: count + 1,
            max: class.capacity,
        });
    }

    let registration = queries::insert_registration(&tx, member_id, class_id, &now).map_err(|e| {
        if is_unique_violation(&e) {
            RegistrationError::DuplicateRegistration {
                member_id,
                class_id,
            }
        } else if is_foreign_key_violation(&e)
            && matches!(queries::get_member(&tx, member_id), Ok(None))
        {
            RegistrationError::NotFound {
                kind: EntityKind::Member,
                id: member_id,
            }
        } else {
            RegistrationError::from(e)
        }
    })?;
    tx.commit()?;
    Ok(registration)
}
