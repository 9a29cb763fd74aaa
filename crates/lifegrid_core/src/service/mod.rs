//! Core use-case services.
//!
//! # Responsibility
//! - Reconcile the session between the auth provider and local cache.
//! - Run UI intents against remote persistence and hold the resulting state.
//!
//! # See also
//! - `provider` for the remote contracts these services depend on.

pub mod identity_service;
pub mod store_state;
pub mod year_data_store;
