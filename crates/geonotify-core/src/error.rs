use thiserror::Error;

/// Reasons an event cannot be evaluated. Rendered into the `error` variant
/// of an evaluation result, never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Location Services error: {}", code_label(.0))]
    Platform(Option<i32>),

    #[error("Geofence transition error: {0}")]
    UnknownTransitionKind(i32),
}

fn code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}

/// Why a by-date window could not be resolved. Absorbed as "not eligible".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Incomplete date window: since, until and time are all required")]
    Incomplete,

    #[error("Invalid date/time: {0}")]
    InvalidDate(String),

    #[error("Date window out of range after adding {0} days")]
    Overflow(i64),
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid geofence id: {0}")]
    InvalidId(String),

    #[error("Invalid latitude {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("Invalid radius {0}: must be a positive number of metres")]
    InvalidRadius(f64),

    #[error("Invalid transition type {0}: must be 1 (enter), 2 (exit) or 3 (both)")]
    InvalidTransitionType(i32),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
}
