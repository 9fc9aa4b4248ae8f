// src/state.rs

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{config::Config, grading::GradingMode};

/// Shared handler state: the database pool and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for GradingMode {
    fn from_ref(state: &AppState) -> Self {
        state.config.grading_mode
    }
}
