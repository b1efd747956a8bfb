//! # Game Coach
//!
//! Decides when to show a player a coaching message (welcome, celebration,
//! mastery, or encouragement) and remembers what was shown so the coach does
//! not repeat itself. Scene progress comes from `zone_progress`.
//!
//! ## Core Components
//!
//! - **session**: per-(profile, zone) session state with daily reset
//! - **decision**: the trigger rules and the [`SessionManager`] that applies them
//! - **messages**: message templates
//! - **coach**: the [`GameCoach`] facade for zone entry
//!
//! ## Protocol
//!
//! `decide` updates visit bookkeeping on every call. `mark_shown` is called
//! only after a message is actually displayed and is the sole input to the
//! cooldown and the shown history.

pub mod coach;
pub mod config;
pub mod decision;
pub mod messages;
pub mod session;

pub use coach::*;
pub use config::*;
pub use decision::*;
pub use messages::*;
pub use session::*;
