//! Core types - Ticks, order state and outcome notifications

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::Error;

/// Units bought when the threshold is crossed. No sizing logic.
pub const BUY_QUANTITY: u32 = 1;

/// Single price observation for an instrument.
///
/// `code` is optional because ticks decoded from an external feed may omit
/// it; such ticks are rejected by validation rather than by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    #[serde(default)]
    pub code: Option<String>,
    pub price: Decimal,
}

impl Tick {
    pub fn new(code: impl Into<String>, price: impl Into<Decimal>) -> Self {
        Self {
            code: Some(code.into()),
            price: price.into(),
        }
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} @ {}", code, self.price),
            None => write!(f, "<no code> @ {}", self.price),
        }
    }
}

/// Order lifecycle. Placed and Errored are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    #[default]
    Idle,
    Placed,
    Errored,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderState::Idle)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderState::Idle => write!(f, "IDLE"),
            OrderState::Placed => write!(f, "PLACED"),
            OrderState::Errored => write!(f, "ERRORED"),
        }
    }
}

/// Buy went through.
#[derive(Debug, Clone)]
pub struct PlacedEvent {
    pub order_id: Uuid,
    pub code: String,
    pub price: Decimal,
    pub at: DateTime<Utc>,
}

/// Buy attempt failed; the order will never trade.
#[derive(Debug, Clone)]
pub struct ErroredEvent {
    pub order_id: Uuid,
    pub code: String,
    pub price: Decimal,
    pub error: Arc<Error>,
    pub at: DateTime<Utc>,
}
