//! External collaborator ports.
//!
//! # Responsibility
//! - Define the auth and persistence contracts the store depends on.
//! - Validate loosely-typed remote responses at the boundary.
//!
//! # Invariants
//! - Ports are object-safe `async_trait` traits so hosts and tests can inject
//!   their own implementations.
//! - No port implementation retries on failure.

pub mod auth;
pub mod persistence;
