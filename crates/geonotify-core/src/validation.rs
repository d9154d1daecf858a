use crate::error::ValidationError;
use crate::notification::NotificationConfig;

/// Validator for geofences submitted for watching.
///
/// Date window fields are not checked; a malformed window is stored as
/// given and never fires.
pub struct Validator;

impl Validator {
    /// Must be non-empty and at most 256 chars.
    pub fn validate_id(id: &str) -> Result<(), ValidationError> {
        if id.trim().is_empty() {
            return Err(ValidationError::InvalidId("id cannot be empty".to_string()));
        }
        if id.len() > 256 {
            return Err(ValidationError::InvalidId(format!(
                "id too long: {} chars (max 256)",
                id.len()
            )));
        }
        Ok(())
    }

    pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
        if lat.is_nan() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::InvalidLatitude(lat));
        }
        Ok(())
    }

    pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
        if lon.is_nan() || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::InvalidLongitude(lon));
        }
        Ok(())
    }

    pub fn validate_radius(radius: f64) -> Result<(), ValidationError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ValidationError::InvalidRadius(radius));
        }
        Ok(())
    }

    /// 1 (enter), 2 (exit) or 3 (both).
    pub fn validate_transition_type(transition_type: i32) -> Result<(), ValidationError> {
        if !(1..=3).contains(&transition_type) {
            return Err(ValidationError::InvalidTransitionType(transition_type));
        }
        Ok(())
    }

    pub fn validate_config(config: &NotificationConfig) -> Result<(), ValidationError> {
        Self::validate_id(&config.region_id)?;
        Self::validate_latitude(config.latitude)?;
        Self::validate_longitude(config.longitude)?;
        Self::validate_radius(config.radius)?;
        Self::validate_transition_type(config.transition_type)?;
        Ok(())
    }
}
