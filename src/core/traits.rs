//! Core traits - Seams between the order logic and the outside world

use rust_decimal::Decimal;

use crate::core::{Result, Tick};

/// Order placement service - implemented by venues and test doubles.
///
/// Calls are synchronous. An `Err` means the trade did not happen.
pub trait OrderService: Send + Sync {
    /// Buy `quantity` units of `code` at `price`
    fn buy(&self, code: &str, quantity: u32, price: Decimal) -> Result<()>;

    /// Sell `quantity` units of `code` at `price`
    fn sell(&self, code: &str, quantity: u32, price: Decimal) -> Result<()>;
}

/// Anything that consumes price ticks.
pub trait TickHandler: Send + Sync {
    /// Handle a tick given as parts. Errors only for malformed input.
    fn respond_to_tick(&self, code: &str, price: Decimal) -> Result<()>;

    /// Handle a decoded tick, whose code may be absent.
    fn respond(&self, tick: &Tick) -> Result<()>;
}
