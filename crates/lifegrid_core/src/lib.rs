//! Core domain logic for LifeGrid, a year-at-a-glance habit tracker.
//! This crate is the single source of truth for calendar, session and
//! year-data invariants; UI hosts only render `StoreState`.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod service;

pub use cache::{CacheError, CacheResult, LocalCache, MemoryCache, SqliteLocalCache};
pub use calendar::date_key::{canonicalize_date_key, decode_date_key, encode_date_key, DateKeyError};
pub use calendar::grid::{build_month_grid, MonthGrid, DAYS_IN_WEEK, WEEKS_IN_GRID};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::data_key::{DataKey, DataKeyId};
pub use model::day_date::{DayDate, DayDateError};
pub use model::session::{Session, SessionState, User};
pub use model::year_data::{YearData, YearDataMap};
pub use provider::auth::{AuthError, AuthProvider, OAuthCredential, SignInResult};
pub use provider::persistence::{
    PersistenceError, PersistenceProvider, PersistenceResult, UserYearData,
};
pub use service::identity_service::{IdentityError, IdentityResult, IdentitySessionCache};
pub use service::store_state::{DayWrite, StoreState};
pub use service::year_data_store::{StoreError, StoreResult, ValidationError, YearDataStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
