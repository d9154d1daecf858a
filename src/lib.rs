pub mod config;
pub mod db;
pub mod dispatch;
pub mod models;
pub mod routes;
pub mod state;

pub use config::Config;
pub use db::{current_epoch_ms, init_pool, run_migrations, DbError};
pub use dispatch::{process_transition, OutboxNotifier, TransitionOutcome};
pub use routes::create_router;
pub use state::{AppState, Clock};
