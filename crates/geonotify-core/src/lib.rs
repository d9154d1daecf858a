//! geonotify Core - Domain models, eligibility rules, and transition evaluation.
//!
//! This crate holds the logic that turns a geofence transition event into
//! notification dispatches and a broadcast result. It performs no I/O and
//! does no logging; stores and notifiers are supplied by the caller.

pub mod broadcast;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod notification;
pub mod storage;
pub mod validation;
pub mod window;

// Re-exports for convenience
pub use broadcast::{TransitionBroadcast, TRANSITION_ACTION};
pub use error::{StorageError, TransitionError, ValidationError, WindowError};
pub use evaluator::{EvaluationResult, TransitionEvaluator};
pub use event::{RegionEvent, TransitionKind};
pub use notification::{NotificationConfig, NotificationPayload};
pub use storage::{NotificationSnapshot, NotificationStore, Notifier};
pub use validation::Validator;
pub use window::{is_eligible, DateWindow};

#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::{InMemoryNotificationStore, RecordingNotifier};
