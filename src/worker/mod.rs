//! Parallel search workers.
//!
//! This module provides:
//! - The command/event protocol spoken between coordinator and workers
//! - The per-worker search loop
//! - A pool of worker threads

mod pool;
pub mod protocol;
mod search;

pub use pool::WorkerPool;
pub use protocol::{Command, Event, Match, SessionId};
pub use search::SearchLoop;
