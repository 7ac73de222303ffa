use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{user_insert_error, validate_user};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Admin, Member, NewUser};
use crate::state::AppState;

// POST /api/members
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    validate_user(&body)?;
    let member = {
        let db = state.conn();
        queries::insert_member(&db, &body).map_err(user_insert_error)?
    };
    tracing::info!(member_id = member.id, "member created");
    Ok((StatusCode::CREATED, Json(member)))
}

// POST /api/admins
pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<Admin>), AppError> {
    validate_user(&body)?;
    let admin = {
        let db = state.conn();
        queries::insert_admin(&db, &body).map_err(user_insert_error)?
    };
    tracing::info!(admin_id = admin.id, "admin created");
    Ok((StatusCode::CREATED, Json(admin)))
}
