//! Input validation - stateless checks run before any order state is touched.

use rust_decimal::Decimal;

use crate::core::{Error, Result};

pub const SERVICE_NULL: &str = "OrderService cannot be null.";
pub const THRESHOLD_NOT_POSITIVE: &str = "PriceThreshold must be greater than zero.";
pub const CODE_NULL: &str = "Code cannot be null.";
pub const CODE_EMPTY: &str = "Code cannot be empty.";
pub const PRICE_NOT_POSITIVE: &str = "Price must be greater than zero.";

/// Check order construction inputs and hand back the present service.
/// The service is checked before the threshold.
pub fn validate_order_input<S>(service: Option<S>, price_threshold: Decimal) -> Result<S> {
    let Some(service) = service else {
        return Err(Error::InvalidConfiguration(SERVICE_NULL.into()));
    };
    if price_threshold <= Decimal::ZERO {
        return Err(Error::InvalidConfiguration(THRESHOLD_NOT_POSITIVE.into()));
    }
    Ok(service)
}

/// Check a tick and hand back its code. Absent and empty codes are
/// reported separately; a whitespace-only code counts as empty.
pub fn validate_tick(code: Option<&str>, price: Decimal) -> Result<&str> {
    let code = match code {
        None => return Err(Error::InvalidInput(CODE_NULL.into())),
        Some(code) if code.trim().is_empty() => {
            return Err(Error::InvalidInput(CODE_EMPTY.into()));
        }
        Some(code) => code,
    };
    if price <= Decimal::ZERO {
        return Err(Error::InvalidInput(PRICE_NOT_POSITIVE.into()));
    }
    Ok(code)
}
