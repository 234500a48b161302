//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a stopwatch ID carries at least one non-whitespace character.
///
/// IDs are opaque and caller-chosen, so nothing else about their content or
/// length is checked: any id the HTTP routes accept can be listened on.
///
/// # Examples
///
/// ```ignore
/// validate_stopwatch_id("Xk3v9") // Ok
/// validate_stopwatch_id(" a ")   // Ok - kept as-is
/// validate_stopwatch_id("   ")   // Err - blank
/// ```
pub fn validate_stopwatch_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("stopwatch_id_blank");
        err.message = Some("Stopwatch ID must not be blank".into());
        return Err(err);
    }

    Ok(())
}
