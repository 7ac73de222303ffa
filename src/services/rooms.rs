use rusqlite::Connection;

use crate::db::queries;
use crate::errors::BookingError;
use crate::models::Room;

pub fn add_room(
    conn: &Connection,
    admin_id: Option<i64>,
    name: &str,
    capacity: i64,
) -> Result<Room, BookingError> {
    if capacity < 1 {
        return Err(BookingError::InvalidCapacity(capacity));
    }
    let room = queries::insert_room(conn, admin_id, name.trim(), capacity)?;
    tracing::info!(room_id = room.id, capacity, "room added");
    Ok(room)
}
