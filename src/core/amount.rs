//! Amount text handling: what the input field accepts and what counts as a
//! convertible amount.

use super::error::ConvertError;

/// Returns true when `text` is an acceptable state of the amount field:
/// optional integer digits, at most one decimal point, optional fraction digits.
///
/// Partial input such as `""`, `"."` or `"12."` is accepted here; whether it is a
/// usable amount is decided by [`parse_amount`].
pub fn accepts_amount_text(text: &str) -> bool {
    let mut seen_point = false;
    for c in text.chars() {
        match c {
            '0'..='9' => {}
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    true
}

/// Parses amount text into a positive finite number.
///
/// `Ok(None)` means the field is blank and nothing should happen.
pub fn parse_amount(text: &str) -> Result<Option<f64>, ConvertError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(Some(value)),
        _ => Err(ConvertError::InvalidAmount),
    }
}
