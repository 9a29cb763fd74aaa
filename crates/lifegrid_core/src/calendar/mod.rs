//! Calendar utilities used by year-grid rendering.
//!
//! # Responsibility
//! - Encode days as canonical set keys.
//! - Build fixed-shape month grids.
//! - Provide header labels and relative-day checks.
//!
//! # Invariants
//! - All functions here are pure; no I/O and no clock reads except
//!   `DayDate::today()` at call sites.

pub mod date_key;
pub mod grid;
pub mod labels;
