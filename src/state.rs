use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::config::AppConfig;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
        }
    }

    /// Lock the shared connection. A handler that panicked while holding it
    /// dropped its transaction on unwind, so a poisoned lock is still safe to use.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
