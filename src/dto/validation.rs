//! Validation helpers for DTOs.

use validator::ValidationError;

/// Balls in a cricket over; the fractional part of `overs` counts completed balls.
const BALLS_PER_OVER: u32 = 6;

/// Validates a cricket overs string: `"N"` or `"N.B"` where `B` is a completed ball count.
///
/// # Examples
///
/// ```ignore
/// validate_overs("15")   // Ok
/// validate_overs("15.2") // Ok
/// validate_overs("15.6") // Err - six balls make a full over
/// validate_overs("1.")   // Err - missing ball count
/// ```
pub fn validate_overs(overs: &str) -> Result<(), ValidationError> {
    let (whole, balls) = match overs.split_once('.') {
        Some((whole, balls)) => (whole, Some(balls)),
        None => (overs, None),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("overs_format");
        err.message = Some(format!("overs must look like `15` or `15.2` (got `{overs}`)").into());
        return Err(err);
    }

    if let Some(balls) = balls {
        let valid = balls.len() == 1
            && balls
                .parse::<u32>()
                .is_ok_and(|count| count < BALLS_PER_OVER);
        if !valid {
            let mut err = ValidationError::new("overs_balls");
            err.message = Some(
                format!("ball count after the dot must be between 0 and 5 (got `{overs}`)").into(),
            );
            return Err(err);
        }
    }

    Ok(())
}

/// Rejects identifiers made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
