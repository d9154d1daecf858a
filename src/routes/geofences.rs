use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use geonotify_core::{NotificationConfig, Validator};

use crate::db;
use crate::models::{GetGeofencesResponse, RemoveAllResponse, UpsertGeofenceResponse};
use crate::state::AppState;

/// POST /api/geofences - Add or replace a watched geofence.
pub async fn upsert_geofence(
    State(state): State<AppState>,
    Json(config): Json<NotificationConfig>,
) -> Response {
    if let Err(e) = Validator::validate_config(&config) {
        return (StatusCode::BAD_REQUEST, format!("Validation error: {}", e)).into_response();
    }

    match db::upsert_geofence(&state.pool, &config).await {
        Ok(created) => {
            tracing::debug!(id = %config.region_id, created, "Geofence stored");
            let (status, label) = if created {
                (StatusCode::CREATED, "created")
            } else {
                (StatusCode::OK, "replaced")
            };
            (
                status,
                Json(UpsertGeofenceResponse {
                    status: label,
                    geofence: config,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to store geofence: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

/// GET /api/geofences - List watched geofences.
pub async fn get_geofences(State(state): State<AppState>) -> Response {
    match db::list_geofences(&state.pool).await {
        Ok(geofences) => Json(GetGeofencesResponse { geofences }).into_response(),
        Err(e) => {
            tracing::error!("Failed to list geofences: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

/// GET /api/geofences/:id - Get one geofence.
pub async fn get_geofence(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match db::get_geofence(&state.pool, &id).await {
        Ok(Some(config)) => Json(config).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Geofence not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to get geofence: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

/// DELETE /api/geofences/:id - Stop watching a geofence.
pub async fn remove_geofence(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match db::remove_geofence(&state.pool, &id).await {
        Ok(true) => Json(serde_json::json!({ "id": id })).into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Geofence not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to remove geofence: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

/// DELETE /api/geofences - Stop watching every geofence.
pub async fn remove_all_geofences(State(state): State<AppState>) -> Response {
    match db::remove_all_geofences(&state.pool).await {
        Ok(removed) => {
            tracing::info!("Removed {} geofences", removed);
            Json(RemoveAllResponse { removed }).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to remove geofences: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}
