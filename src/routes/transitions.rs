use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;

use geonotify_core::RegionEvent;

use crate::db;
use crate::dispatch::process_transition;
use crate::models::{
    GetDeliveryLogResponse, GetTransitionLogResponse, LogQuery, TransitionQuery,
    TransitionResponse,
};
use crate::state::AppState;

/// Parse the `at` override, with or without seconds.
pub fn parse_at(at: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// POST /api/transitions?at=... - Deliver a transition event.
pub async fn post_transition(
    State(state): State<AppState>,
    Query(query): Query<TransitionQuery>,
    Json(event): Json<RegionEvent>,
) -> Response {
    let now = match query.at.as_deref() {
        Some(at) => match parse_at(at) {
            Some(now) => now,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    "Invalid at: expected YYYY-MM-DDTHH:MM[:SS]",
                )
                    .into_response()
            }
        },
        None => state.now(),
    };

    match process_transition(&state.pool, &event, now).await {
        Ok(outcome) => Json(TransitionResponse {
            id: outcome.id,
            uuid: outcome.uuid.to_string(),
            notified: outcome.delivered.len(),
            result: outcome.result,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to process transition: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

/// GET /api/transitions?after_id=...&limit=... - Poll recorded broadcasts.
pub async fn get_transitions(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Response {
    match db::get_transitions_after(&state.pool, query.after_id, query.limit).await {
        Ok((entries, max_id, has_more)) => Json(GetTransitionLogResponse {
            after_id: query.after_id,
            limit: query.limit.clamp(1, db::MAX_LIMIT),
            max_id,
            has_more,
            entries,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to get transition log: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

/// GET /api/deliveries?after_id=...&limit=... - Poll dispatched notifications.
pub async fn get_deliveries(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Response {
    match db::get_deliveries_after(&state.pool, query.after_id, query.limit).await {
        Ok((entries, max_id, has_more)) => Json(GetDeliveryLogResponse {
            after_id: query.after_id,
            limit: query.limit.clamp(1, db::MAX_LIMIT),
            max_id,
            has_more,
            entries,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to get delivery log: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_at() {
        assert!(parse_at("2024-01-08T10:00").is_some());
        assert!(parse_at("2024-01-08T10:00:30").is_some());
        assert!(parse_at("2024-01-08").is_none());
        assert!(parse_at("yesterday").is_none());
    }
}
