pub mod geofences;
pub mod transitions;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Watched geofences
        .route(
            "/api/geofences",
            post(geofences::upsert_geofence)
                .get(geofences::get_geofences)
                .delete(geofences::remove_all_geofences),
        )
        .route(
            "/api/geofences/{id}",
            get(geofences::get_geofence).delete(geofences::remove_geofence),
        )
        // Transition events and their logs
        .route(
            "/api/transitions",
            post(transitions::post_transition).get(transitions::get_transitions),
        )
        .route("/api/deliveries", get(transitions::get_deliveries))
        // Health check
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
