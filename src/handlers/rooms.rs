use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Room;
use crate::services::rooms;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RoomBody {
    #[serde(default)]
    pub admin_id: Option<i64>,
    pub name: String,
    pub capacity: i64,
}

// POST /api/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RoomBody>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("room name is required".into()));
    }
    let db = state.conn();
    let room = rooms::add_room(&db, body.admin_id, &body.name, body.capacity)?;
    Ok((StatusCode::CREATED, Json(room)))
}

// GET /api/rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Room>>, AppError> {
    let db = state.conn();
    let rooms = queries::list_rooms(&db)?;
    Ok(Json(rooms))
}
