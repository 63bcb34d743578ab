//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every timestamp is reduced to `f64` seconds before any arithmetic
//! - One `ResolvedBaseline` per run; relative time is `absolute - baseline`, rounded to 1 µs
//! - Tick channels are millisecond counters

mod blueprint;
mod channel;
mod config;
mod error;
mod segment;
mod sink;
mod source;
mod time;
mod value;

pub use blueprint::*;
pub use channel::{clean_channel_name, dedupe_channels, ILLEGAL_CHANNEL_CHARS};
pub use config::*;
pub use error::*;
pub use segment::*;
pub use sink::*;
pub use source::*;
pub use time::*;
pub use value::*;
