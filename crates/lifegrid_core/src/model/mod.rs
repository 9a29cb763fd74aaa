//! Domain model for the life-variable tracker.
//!
//! # Responsibility
//! - Define canonical data structures used by store and calendar logic.
//!
//! # Invariants
//! - Day references use a zero-indexed month field.
//! - Session flags are derived from user/token parts, never stored.
//! - Day presence is stored with set semantics.

pub mod data_key;
pub mod day_date;
pub mod session;
pub mod year_data;
