//! tick-order - Core Library
//! One-shot threshold buy order driven by concurrent price ticks

// Public modules
pub mod core;
pub mod validation;
pub mod execution;
pub mod exchanges;
pub mod feeds;

// Re-exports
pub use crate::core::{
    Config, Error, ErroredEvent, OrderService, OrderState, PlacedEvent, Result, Tick, TickHandler,
};
pub use execution::{Order, OrderBuilder, SubscriptionId};
