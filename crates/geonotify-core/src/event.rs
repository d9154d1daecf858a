use serde::{Deserialize, Serialize};

/// Kind of a geofence transition, carried on the wire as its platform code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum TransitionKind {
    Enter,
    Exit,
    /// Any other platform code (dwell, garbage, ...).
    Unknown(i32),
}

impl TransitionKind {
    pub const ENTER_CODE: i32 = 1;
    pub const EXIT_CODE: i32 = 2;

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::ENTER_CODE => TransitionKind::Enter,
            Self::EXIT_CODE => TransitionKind::Exit,
            other => TransitionKind::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            TransitionKind::Enter => Self::ENTER_CODE,
            TransitionKind::Exit => Self::EXIT_CODE,
            TransitionKind::Unknown(code) => code,
        }
    }

    /// Enter and exit are the only kinds that get processed.
    pub fn is_known(self) -> bool {
        !matches!(self, TransitionKind::Unknown(_))
    }
}

impl From<i32> for TransitionKind {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<TransitionKind> for i32 {
    fn from(kind: TransitionKind) -> Self {
        kind.code()
    }
}

impl Default for TransitionKind {
    fn default() -> Self {
        TransitionKind::Unknown(-1)
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionKind::Enter => write!(f, "enter"),
            TransitionKind::Exit => write!(f, "exit"),
            TransitionKind::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// One transition callback from the location service. Consumed once.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEvent {
    #[serde(default)]
    pub has_error: bool,
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub transition_type: TransitionKind,
    #[serde(default)]
    pub triggered_region_ids: Vec<String>,
}

impl RegionEvent {
    pub fn new(transition_type: TransitionKind, triggered_region_ids: Vec<String>) -> Self {
        Self {
            has_error: false,
            error_code: None,
            transition_type,
            triggered_region_ids,
        }
    }

    /// Create an event reporting a location service failure.
    pub fn platform_error(error_code: i32) -> Self {
        Self {
            has_error: true,
            error_code: Some(error_code),
            ..Self::default()
        }
    }

    /// True when the event will reach store lookups (no error, enter or exit).
    pub fn is_actionable(&self) -> bool {
        !self.has_error && self.transition_type.is_known()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_codes() {
        assert_eq!(TransitionKind::from_code(1), TransitionKind::Enter);
        assert_eq!(TransitionKind::from_code(2), TransitionKind::Exit);
        assert_eq!(TransitionKind::from_code(4), TransitionKind::Unknown(4));
        assert_eq!(TransitionKind::Unknown(4).code(), 4);
        assert!(!TransitionKind::Unknown(4).is_known());
    }

    #[test]
    fn test_event_from_json() {
        let event: RegionEvent = serde_json::from_str(
            r#"{"transitionType": 2, "triggeredRegionIds": ["home", "work"]}"#,
        )
        .unwrap();

        assert!(!event.has_error);
        assert_eq!(event.transition_type, TransitionKind::Exit);
        assert_eq!(event.triggered_region_ids, vec!["home", "work"]);
        assert!(event.is_actionable());
    }

    #[test]
    fn test_missing_transition_is_unknown() {
        let event: RegionEvent = serde_json::from_str(r#"{"hasError": false}"#).unwrap();
        assert_eq!(event.transition_type, TransitionKind::Unknown(-1));
        assert!(!event.is_actionable());
    }

    #[test]
    fn test_error_event_not_actionable() {
        let event = RegionEvent::platform_error(1000);
        assert!(event.has_error);
        assert!(!event.is_actionable());
    }
}
