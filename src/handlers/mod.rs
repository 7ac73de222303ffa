pub mod classes;
pub mod health;
pub mod rooms;
pub mod sessions;
pub mod trainers;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::errors::{is_unique_violation, AppError};
use crate::models::NewUser;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/admins", post(users::create_admin))
        .route("/api/members", post(users::create_member))
        .route("/api/trainers", post(trainers::create_trainer))
        .route(
            "/api/trainers/:id/availability",
            post(trainers::set_availability),
        )
        .route("/api/trainers/:id/schedule", get(trainers::get_schedule))
        .route("/api/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/api/sessions", post(sessions::schedule_session))
        .route(
            "/api/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route(
            "/api/classes/:id/registrations",
            get(classes::list_registrations).post(classes::register),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn validate_user(user: &NewUser) -> Result<(), AppError> {
    if user.first_name.trim().is_empty() || user.last_name.trim().is_empty() {
        return Err(AppError::BadRequest("first and last name are required".into()));
    }
    if !user.email.contains('@') {
        return Err(AppError::BadRequest(format!("invalid email: {}", user.email)));
    }
    Ok(())
}

fn user_insert_error(e: rusqlite::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::BadRequest("email is already registered".into())
    } else {
        AppError::Database(e)
    }
}
