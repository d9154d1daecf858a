use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationResult;
use crate::notification::NotificationConfig;

/// Action name carried by every transition broadcast.
pub const TRANSITION_ACTION: &str = "geonotify.TRANSITION";

/// Record emitted to listeners after every event.
///
/// Carries `error` for rejected events and `transitionData` only when at
/// least one config matched; an event matching nothing broadcasts the bare
/// action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionBroadcast {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_data: Option<Vec<NotificationConfig>>,
}

impl TransitionBroadcast {
    /// Whether application-level listeners should receive the matched configs.
    pub fn notifies_listeners(&self) -> bool {
        self.transition_data.is_some()
    }
}

impl From<&EvaluationResult> for TransitionBroadcast {
    fn from(result: &EvaluationResult) -> Self {
        let (error, transition_data) = match result {
            EvaluationResult::Error(message) => (Some(message.clone()), None),
            EvaluationResult::Fired(configs) if configs.is_empty() => (None, None),
            EvaluationResult::Fired(configs) => (None, Some(configs.clone())),
        };
        Self {
            action: TRANSITION_ACTION.to_string(),
            error,
            transition_data,
        }
    }
}
