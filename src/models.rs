use serde::{Deserialize, Serialize};

use geonotify_core::{EvaluationResult, NotificationConfig, NotificationPayload, TransitionBroadcast};

/// A recorded transition broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub id: i64,
    pub uuid: String,
    pub ts_epoch_ms: i64,
    pub broadcast: TransitionBroadcast,
}

/// A notification handed to the notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub id: i64,
    pub transition_uuid: String,
    pub ts_epoch_ms: i64,
    pub notification: NotificationPayload,
}

/// Response for adding or replacing a geofence.
#[derive(Debug, Serialize)]
pub struct UpsertGeofenceResponse {
    pub status: &'static str, // "created" or "replaced"
    pub geofence: NotificationConfig,
}

/// Response for listing watched geofences.
#[derive(Debug, Serialize)]
pub struct GetGeofencesResponse {
    pub geofences: Vec<NotificationConfig>,
}

/// Response for removing all geofences.
#[derive(Debug, Serialize)]
pub struct RemoveAllResponse {
    pub removed: u64,
}

/// Query parameters for posting a transition.
#[derive(Debug, Deserialize)]
pub struct TransitionQuery {
    /// Evaluation instant, "YYYY-MM-DDTHH:MM[:SS]". Defaults to the local clock.
    pub at: Option<String>,
}

/// Response for posting a transition.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub id: i64,
    pub uuid: String,
    pub notified: usize,
    pub result: EvaluationResult,
}

/// Query parameters for log endpoints.
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub after_id: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Response for the transition log endpoint.
#[derive(Debug, Serialize)]
pub struct GetTransitionLogResponse {
    pub after_id: i64,
    pub limit: i64,
    pub max_id: i64,
    pub has_more: bool,
    pub entries: Vec<TransitionLogEntry>,
}

/// Response for the delivery log endpoint.
#[derive(Debug, Serialize)]
pub struct GetDeliveryLogResponse {
    pub after_id: i64,
    pub limit: i64,
    pub max_id: i64,
    pub has_more: bool,
    pub entries: Vec<DeliveryLogEntry>,
}
