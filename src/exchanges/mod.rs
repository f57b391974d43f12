//! Order service implementations

pub mod paper;

pub use paper::{Fill, PaperOrderService, Side};
