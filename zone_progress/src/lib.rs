//! # Zone Progress
//!
//! Scene graphs, progress records and the reconciliation engine that turns
//! permanent and transient records into per-scene display statuses.
//! This crate holds no coaching logic; `game_coach` builds on it.

pub mod config;
pub mod error;
pub mod progress;
pub mod scenes;
pub mod storage;

pub use config::*;
pub use error::*;
pub use progress::*;
pub use scenes::*;
pub use storage::*;
