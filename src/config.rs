use std::env;

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// How long a writer waits on SQLite's write lock before giving up with a
    /// transient conflict.
    pub busy_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "clubsched.db".to_string()),
            busy_timeout_ms: env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}
