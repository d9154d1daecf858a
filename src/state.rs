use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Source of the evaluation instant when a request does not pin one.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub clock: Clock,
}

impl AppState {
    /// State evaluating against the local wall clock.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(|| chrono::Local::now().naive_local()))
    }

    pub fn with_clock(pool: SqlitePool, clock: Clock) -> Self {
        Self { pool, clock }
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}
