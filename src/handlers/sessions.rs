use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::PtSession;
use crate::services::scheduling::{self, SessionRequest};
use crate::state::AppState;

// POST /api/sessions
pub async fn schedule_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SessionRequest>,
) -> Result<(StatusCode, Json<PtSession>), AppError> {
    let mut db = state.conn();
    let session = scheduling::schedule_session(&mut db, &body)?;
    Ok((StatusCode::CREATED, Json(session)))
}
