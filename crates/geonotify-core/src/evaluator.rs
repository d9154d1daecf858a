use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::event::RegionEvent;
use crate::notification::NotificationConfig;
use crate::storage::{NotificationStore, Notifier};
use crate::window::is_eligible;

/// Outcome of evaluating one transition event.
///
/// Serializes as `{"error": "..."}` or `{"fired": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationResult {
    Error(String),
    /// Every stored config matched by a triggered region, in trigger order,
    /// annotated with the transition. Presence does not mean a notification
    /// was dispatched.
    Fired(Vec<NotificationConfig>),
}

impl EvaluationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, EvaluationResult::Error(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EvaluationResult::Error(message) => Some(message),
            EvaluationResult::Fired(_) => None,
        }
    }

    pub fn fired(&self) -> Option<&[NotificationConfig]> {
        match self {
            EvaluationResult::Error(_) => None,
            EvaluationResult::Fired(configs) => Some(configs),
        }
    }
}

impl From<TransitionError> for EvaluationResult {
    fn from(error: TransitionError) -> Self {
        EvaluationResult::Error(error.to_string())
    }
}

/// Turns transition events into notification dispatches.
pub struct TransitionEvaluator<S, N> {
    store: S,
    notifier: N,
}

impl<S: NotificationStore, N: Notifier> TransitionEvaluator<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Evaluate an event at `now`.
    ///
    /// Each triggered region is looked up in order; duplicates are processed
    /// independently. A region with no config (or a failing lookup) is
    /// skipped. A present payload is dispatched when eligible.
    pub fn evaluate(&self, event: &RegionEvent, now: NaiveDateTime) -> EvaluationResult {
        if let Err(error) = Self::check(event) {
            return error.into();
        }

        let mut fired = Vec::new();
        for region_id in &event.triggered_region_ids {
            let config = match self.store.get(region_id) {
                Ok(Some(config)) => config,
                Ok(None) | Err(_) => continue,
            };

            if let Some(payload) = &config.notification {
                if is_eligible(payload, now) {
                    self.notifier.notify(payload);
                }
            }

            fired.push(config.annotated(event.transition_type));
        }

        EvaluationResult::Fired(fired)
    }

    fn check(event: &RegionEvent) -> Result<(), TransitionError> {
        if event.has_error {
            return Err(TransitionError::Platform(event.error_code));
        }
        if !event.transition_type.is_known() {
            return Err(TransitionError::UnknownTransitionKind(
                event.transition_type.code(),
            ));
        }
        Ok(())
    }
}
