use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, EntityKind, RegistrationError};
use crate::models::{ClassRegistration, GroupClass};
use crate::services::registration;
use crate::services::schedule::{self, ClassEnrolment};
use crate::services::scheduling::{self, ClassRequest};
use crate::state::AppState;

// POST /api/classes
pub async fn create_class(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClassRequest>,
) -> Result<(StatusCode, Json<GroupClass>), AppError> {
    if body.title.trim().is_empty() {
        return Err(AppError::BadRequest("class title is required".into()));
    }
    let mut db = state.conn();
    let class = scheduling::create_group_class(&mut db, &body)?;
    Ok((StatusCode::CREATED, Json(class)))
}

// GET /api/classes
pub async fn list_classes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClassEnrolment>>, AppError> {
    let now = chrono::Local::now().naive_local();
    let db = state.conn();
    let classes = schedule::upcoming_classes(&db, now)?;
    Ok(Json(classes))
}

#[derive(Deserialize)]
pub struct RegisterBody {
    pub member_id: i64,
}

// POST /api/classes/:id/registrations
pub async fn register(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<i64>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<ClassRegistration>), AppError> {
    let now = chrono::Local::now().naive_local();
    let mut db = state.conn();
    let reg = registration::register_for_class(&mut db, body.member_id, class_id, now)?;
    Ok((StatusCode::CREATED, Json(reg)))
}

// GET /api/classes/:id/registrations
pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<ClassRegistration>>, AppError> {
    let db = state.conn();
    if queries::get_group_class(&db, class_id)?.is_none() {
        return Err(RegistrationError::NotFound {
            kind: EntityKind::GroupClass,
            id: class_id,
        }
        .into());
    }
    let registrations = queries::registrations_for_class(&db, class_id)?;
    Ok(Json(registrations))
}
