//! Tick feeds - Decoding and concurrent delivery

pub mod jsonl;
pub mod dispatcher;

pub use jsonl::{parse_line, read_ticks};
pub use dispatcher::{FeedStats, run_feed};
