//! Bounds on the decimal values the stores accept and persist.
//!
//! Quantities, prices and percentages carry at most four decimal places.
//! Every persisted decimal, totals included, is limited to fifteen
//! significant digits: SQLite returns NUMERIC columns as `f64`, which only
//! round-trips that many digits exactly.

use crate::errors::ServiceError;
use rust_decimal::Decimal;

pub const MAX_INPUT_SCALE: u32 = 4;
pub const MAX_SIGNIFICANT_DIGITS: u32 = 15;

/// Number of significant digits in `value`, ignoring trailing zeros.
pub fn significant_digits(value: Decimal) -> u32 {
    let mut mantissa = value.normalize().mantissa().unsigned_abs();
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

/// Checks a caller-supplied quantity, price or percentage and returns it
/// normalized.
pub fn check_input(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    let value = value.normalize();
    if value.scale() > MAX_INPUT_SCALE {
        return Err(ServiceError::ValidationError(format!(
            "{} allows at most {} decimal places, got {}",
            field, MAX_INPUT_SCALE, value
        )));
    }
    check_storable(field, value)
}

/// Checks that `value` survives a round trip through any supported backend.
pub fn check_storable(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    if significant_digits(value) > MAX_SIGNIFICANT_DIGITS {
        return Err(ServiceError::ValidationError(format!(
            "{} allows at most {} significant digits, got {}",
            field, MAX_SIGNIFICANT_DIGITS, value
        )));
    }
    Ok(value.normalize())
}
