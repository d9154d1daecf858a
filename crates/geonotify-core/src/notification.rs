use serde::{Deserialize, Serialize};

use crate::event::TransitionKind;

/// Notification shown to the user when a geofence transition matches.
///
/// `by_date` gates dispatch behind the `since`/`until`/`time` window, see
/// [`crate::window`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPayload {
    pub id: i64,
    pub title: Option<String>,
    pub text: Option<String>,
    pub open_app_on_click: bool,
    /// Vibration pattern in milliseconds.
    pub vibration: Vec<i64>,
    pub icon: Option<String>,
    pub small_icon: Option<String>,
    /// Opaque application data passed back to listeners.
    pub data: Option<serde_json::Value>,
    pub by_date: bool,
    /// "YYYY-MM-DD" or empty.
    pub since: String,
    /// "YYYY-MM-DD" or empty.
    pub until: String,
    /// "HH:MM" or empty.
    pub time: String,
    /// Lead time in days.
    pub pre_time_range: i64,
}

impl NotificationPayload {
    /// A payload that fires on every transition.
    pub fn always(id: i64, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A payload gated by a date window.
    pub fn by_date(
        id: i64,
        since: impl Into<String>,
        until: impl Into<String>,
        time: impl Into<String>,
        pre_time_range: i64,
    ) -> Self {
        Self {
            id,
            by_date: true,
            since: since.into(),
            until: until.into(),
            time: time.into(),
            pre_time_range,
            ..Self::default()
        }
    }
}

/// A watched geofence and the notification attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    #[serde(rename = "id")]
    pub region_id: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub radius: f64,
    /// Watched transitions when stored (1 enter, 2 exit, 3 both); the
    /// triggering transition code once annotated.
    #[serde(default)]
    pub transition_type: i32,
    #[serde(default)]
    pub notification: Option<NotificationPayload>,
}

impl NotificationConfig {
    pub fn new(region_id: impl Into<String>, notification: Option<NotificationPayload>) -> Self {
        Self {
            region_id: region_id.into(),
            latitude: 0.0,
            longitude: 0.0,
            radius: 100.0,
            transition_type: 3,
            notification,
        }
    }

    /// Copy of this config tagged with the transition that matched it.
    pub fn annotated(&self, kind: TransitionKind) -> Self {
        Self {
            transition_type: kind.code(),
            ..self.clone()
        }
    }
}
