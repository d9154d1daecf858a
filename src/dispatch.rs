use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use std::sync::Mutex;
use uuid::Uuid;

use geonotify_core::{
    EvaluationResult, NotificationPayload, NotificationSnapshot, Notifier, RegionEvent,
    TransitionBroadcast, TransitionEvaluator,
};

use crate::db::{self, DbError};

/// Notifier that queues payloads for the delivery log.
#[derive(Default)]
pub struct OutboxNotifier {
    queued: Mutex<Vec<NotificationPayload>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued payload, in dispatch order.
    pub fn drain(&self) -> Vec<NotificationPayload> {
        let mut queued = self.queued.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *queued)
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, payload: &NotificationPayload) {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(payload.clone());
    }
}

/// Everything produced while handling one transition event.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub id: i64,
    pub uuid: Uuid,
    pub result: EvaluationResult,
    pub broadcast: TransitionBroadcast,
    pub delivered: Vec<NotificationPayload>,
}

/// Evaluate a transition event at `now`, record its broadcast and the
/// notifications it dispatched.
///
/// A region whose stored config cannot be read is skipped like an unknown
/// one. A failure to record deliveries is logged and does not fail the call.
pub async fn process_transition(
    pool: &SqlitePool,
    event: &RegionEvent,
    now: NaiveDateTime,
) -> Result<TransitionOutcome, DbError> {
    tracing::debug!(
        transition = %event.transition_type,
        regions = event.triggered_region_ids.len(),
        "Transition received"
    );

    let snapshot = if event.is_actionable() {
        db::load_snapshot(pool, &event.triggered_region_ids).await
    } else {
        NotificationSnapshot::new()
    };
    if event.is_actionable() && snapshot.is_empty() {
        tracing::debug!("No watched geofence among the triggered regions");
    }

    let outbox = OutboxNotifier::new();
    let result = TransitionEvaluator::new(&snapshot, &outbox).evaluate(event, now);
    let delivered = outbox.drain();

    match &result {
        EvaluationResult::Error(message) => tracing::error!("{}", message),
        EvaluationResult::Fired(configs) => tracing::debug!(
            matched = configs.len(),
            notified = delivered.len(),
            "Geofence transition detected"
        ),
    }

    let broadcast = TransitionBroadcast::from(&result);
    let uuid = Uuid::new_v4();
    let id = db::append_transition(pool, &uuid.to_string(), &broadcast).await?;

    if !delivered.is_empty() {
        if let Err(e) = db::append_deliveries(pool, &uuid.to_string(), &delivered).await {
            tracing::error!("Failed to record deliveries for {}: {}", uuid, e);
        }
    }

    if broadcast.notifies_listeners() {
        tracing::info!(id, %uuid, "Transition broadcast to listeners");
    }

    Ok(TransitionOutcome {
        id,
        uuid,
        result,
        broadcast,
        delivered,
    })
}
