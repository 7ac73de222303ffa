use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use super::{user_insert_error, validate_user};
use crate::db::queries;
use crate::errors::{AppError, AvailabilityError};
use crate::models::{Availability, AvailabilityKind, NewUser, Trainer};
use crate::services::availability;
use crate::services::schedule::{self, TrainerSchedule};
use crate::state::AppState;

// POST /api/trainers
pub async fn create_trainer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<Trainer>), AppError> {
    validate_user(&body)?;
    let trainer = {
        let db = state.conn();
        queries::insert_trainer(&db, &body).map_err(user_insert_error)?
    };
    tracing::info!(trainer_id = trainer.id, "trainer created");
    Ok((StatusCode::CREATED, Json(trainer)))
}

#[derive(Deserialize)]
pub struct AvailabilityBody {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_recurring: bool,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub specific_date: Option<NaiveDate>,
}

// POST /api/trainers/:id/availability
pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<i64>,
    Json(body): Json<AvailabilityBody>,
) -> Result<(StatusCode, Json<Availability>), AppError> {
    let kind = AvailabilityKind::from_parts(
        body.is_recurring,
        body.day_of_week.as_deref(),
        body.specific_date,
    )
    .map_err(AvailabilityError::from)?;

    let mut db = state.conn();
    let entry = availability::set_availability(&mut db, trainer_id, body.start, body.end, kind)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /api/trainers/:id/schedule
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<i64>,
) -> Result<Json<TrainerSchedule>, AppError> {
    let now = chrono::Local::now().naive_local();
    let db = state.conn();
    let view = schedule::trainer_schedule(&db, trainer_id, now.date(), now)?;
    Ok(Json(view))
}
