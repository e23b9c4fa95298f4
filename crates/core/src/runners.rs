//! Runner protocol constants and input validation.
//!
//! Pure functions shared by the API layer and its tests. Shape checks run
//! at the boundary, before any store lookup.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a runner name.
pub const MAX_RUNNER_NAME_LEN: usize = 100;

/// Maximum length of a runner description.
pub const MAX_RUNNER_DESCRIPTION_LEN: usize = 1000;

/// Maximum length of a runner-reported error message.
pub const MAX_ERROR_MESSAGE_LEN: usize = 5000;

/// Maximum length of an abort reason.
pub const MAX_ABORT_REASON_LEN: usize = 5000;

/// `runners.last_contact` is refreshed at most this often.
pub const LAST_CONTACT_UPDATE_INTERVAL_SECS: i64 = 30;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a runner name: non-empty, bounded length.
pub fn validate_runner_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.chars().count() > MAX_RUNNER_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Runner name must be between 1 and {MAX_RUNNER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate an optional runner description.
pub fn validate_runner_description(description: Option<&str>) -> Result<(), CoreError> {
    if let Some(description) = description {
        if description.is_empty() || description.chars().count() > MAX_RUNNER_DESCRIPTION_LEN {
            return Err(CoreError::Validation(format!(
                "Runner description must be between 1 and {MAX_RUNNER_DESCRIPTION_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Validate a progress report. Progress is a percentage.
pub fn validate_progress(progress: Option<i16>) -> Result<(), CoreError> {
    if let Some(progress) = progress {
        if !(0..=100).contains(&progress) {
            return Err(CoreError::Validation(
                "Progress must be between 0 and 100".into(),
            ));
        }
    }
    Ok(())
}

/// Validate a runner-reported error message: required, bounded length.
pub fn validate_error_message(message: &str) -> Result<(), CoreError> {
    if message.is_empty() || message.chars().count() > MAX_ERROR_MESSAGE_LEN {
        return Err(CoreError::Validation(format!(
            "Error message must be between 1 and {MAX_ERROR_MESSAGE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate an abort reason: required, bounded length.
pub fn validate_abort_reason(reason: &str) -> Result<(), CoreError> {
    if reason.is_empty() || reason.chars().count() > MAX_ABORT_REASON_LEN {
        return Err(CoreError::Validation(format!(
            "Abort reason must be between 1 and {MAX_ABORT_REASON_LEN} characters"
        )));
    }
    Ok(())
}

/// Parse a path identifier as a UUID, rejecting malformed values before
/// any lookup.
pub fn parse_uuid(field: &str, value: &str) -> Result<uuid::Uuid, CoreError> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| CoreError::Validation(format!("Invalid {field} '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_bounds() {
        assert!(validate_runner_name("runner name").is_ok());
        assert!(validate_runner_name("").is_err());
        assert!(validate_runner_name(&"a".repeat(200)).is_err());
    }

    #[test]
    fn description_is_optional_but_bounded() {
        assert!(validate_runner_description(None).is_ok());
        assert!(validate_runner_description(Some("super description")).is_ok());
        assert!(validate_runner_description(Some("")).is_err());
        assert!(validate_runner_description(Some(&"a".repeat(5000))).is_err());
    }

    #[test]
    fn progress_bounds() {
        assert!(validate_progress(None).is_ok());
        assert!(validate_progress(Some(0)).is_ok());
        assert!(validate_progress(Some(100)).is_ok());
        assert!(validate_progress(Some(101)).is_err());
        assert!(validate_progress(Some(-1)).is_err());
    }

    #[test]
    fn message_and_reason_bounds() {
        assert!(validate_error_message("Error").is_ok());
        assert!(validate_error_message("").is_err());
        assert!(validate_error_message(&"a".repeat(6000)).is_err());

        assert!(validate_abort_reason("for tests").is_ok());
        assert!(validate_abort_reason(&"reason".repeat(5000)).is_err());
    }

    #[test]
    fn uuid_parsing() {
        assert!(parse_uuid("jobUUID", "910ec12a-d9e6-458b-a274-0abb655f9464").is_ok());
        assert!(parse_uuid("jobUUID", "hello").is_err());
        assert!(parse_uuid("jobUUID", "").is_err());
    }
}
