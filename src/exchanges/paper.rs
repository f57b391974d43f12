//! Paper venue - records trades in memory instead of sending them anywhere

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{Error, OrderService, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One accepted trade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub side: Side,
    pub code: String,
    pub quantity: u32,
    pub price: Decimal,
    pub at: DateTime<Utc>,
}

/// In-memory order service.
///
/// Every call is counted, accepted trades are kept as fills. With
/// `fail_buys` set, every buy is rejected with `Error::Exchange`.
#[derive(Debug, Default)]
pub struct PaperOrderService {
    fail_buys: bool,
    attempts: Mutex<usize>,
    fills: Mutex<Vec<Fill>>,
}

impl PaperOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            fail_buys: true,
            ..Self::default()
        }
    }

    /// Buy/sell calls seen, including rejected ones
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }

    pub fn fills(&self) -> Vec<Fill> {
        self.fills.lock().clone()
    }

    fn record(&self, side: Side, code: &str, quantity: u32, price: Decimal) -> Result<()> {
        *self.attempts.lock() += 1;

        if side == Side::Buy && self.fail_buys {
            warn!("📄 Paper venue rejecting {} {} {} @ {}", side, quantity, code, price);
            return Err(Error::Exchange(format!(
                "paper venue rejected {} {} {} @ {}",
                side, quantity, code, price
            )));
        }

        info!("📄 Paper fill: {} {} {} @ {}", side, quantity, code, price);
        self.fills.lock().push(Fill {
            side,
            code: code.to_string(),
            quantity,
            price,
            at: Utc::now(),
        });
        Ok(())
    }
}

impl OrderService for PaperOrderService {
    fn buy(&self, code: &str, quantity: u32, price: Decimal) -> Result<()> {
        self.record(Side::Buy, code, quantity, price)
    }

    fn sell(&self, code: &str, quantity: u32, price: Decimal) -> Result<()> {
        self.record(Side::Sell, code, quantity, price)
    }
}
