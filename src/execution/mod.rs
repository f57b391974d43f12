//! Execution layer - The threshold order and its notifications

pub mod events;
pub mod order;

pub use events::{Callback, SubscriptionId, Subscribers};
pub use order::{Order, OrderBuilder};
