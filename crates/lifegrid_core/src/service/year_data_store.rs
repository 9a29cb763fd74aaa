//! Central state container for the year grid UI.
//!
//! # Responsibility
//! - Own data keys, per-year day presence, session, calendar cursor and
//!   dialog state.
//! - Run UI intents against the identity cache and persistence provider,
//!   committing results only after the remote call resolves.
//!
//! # Invariants
//! - `loading` is true from construction until `init()` commits, and while a
//!   year fetch is in flight.
//! - The state lock is never held across an await point.
//! - Day writes are applied to the latest committed state, never to a
//!   dispatch-time snapshot; concurrent writes to one bucket cannot overwrite
//!   each other.
//! - Every identity change bumps the session epoch; responses dispatched
//!   under an older epoch are discarded at commit time.
//! - Validation failures never reach a provider.

use crate::cache::LocalCache;
use crate::calendar::date_key::{encode_date_key, DateKeyError};
use crate::calendar::grid::{build_month_grid, MonthGrid};
use crate::model::data_key::{normalize_label, DataKey, DataKeyId};
use crate::model::day_date::{validate_year_month, DayDate, DayDateError};
use crate::model::session::Session;
use crate::provider::auth::AuthProvider;
use crate::provider::persistence::{PersistenceError, PersistenceProvider, UserYearData};
use crate::service::identity_service::{IdentityError, IdentitySessionCache};
use crate::service::store_state::{CalendarCursor, DayWrite, StoreState};
use chrono::Datelike;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejections raised before any remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyLabel,
    InvalidDay(DateKeyError),
    InvalidCalendar(DayDateError),
    NotSignedIn,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLabel => write!(f, "label must not be empty"),
            Self::InvalidDay(err) => write!(f, "{err}"),
            Self::InvalidCalendar(err) => write!(f, "{err}"),
            Self::NotSignedIn => write!(f, "no signed-in user"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDay(err) => Some(err),
            Self::InvalidCalendar(err) => Some(err),
            Self::EmptyLabel | Self::NotSignedIn => None,
        }
    }
}

/// Store action failures.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Identity(IdentityError),
    Persistence(PersistenceError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Identity(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<IdentityError> for StoreError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

struct StoreInner {
    state: StoreState,
    epoch: u64,
    initialized: bool,
    next_write_id: u64,
    /// Year -> epoch of the in-flight fetch for it.
    year_fetches: BTreeMap<i32, u64>,
}

impl StoreInner {
    fn refresh_loading(&mut self) {
        self.state.loading = !self.initialized || !self.year_fetches.is_empty();
    }

    fn signed_in_user(&self) -> Result<(u64, String), ValidationError> {
        self.state
            .session
            .user_id()
            .map(|uid| (self.epoch, uid.to_string()))
            .ok_or(ValidationError::NotSignedIn)
    }

    /// Installs a new identity and starts a new epoch.
    fn begin_epoch(&mut self, session: Session) -> u64 {
        self.epoch += 1;
        self.year_fetches.clear();
        self.state.replace_identity(session);
        self.epoch
    }

    /// Whether `year` is neither loaded nor already being fetched.
    fn needs_year_fetch(&self, year: i32) -> bool {
        !self.state.year_data_map.is_year_cached(year) && !self.year_fetches.contains_key(&year)
    }

    /// Registers a fetch for `year` when signed in, returns `(uid, epoch)`.
    fn register_year_fetch(&mut self, year: i32) -> Option<(String, u64)> {
        let uid = self.state.session.user_id()?.to_string();
        self.year_fetches.insert(year, self.epoch);
        self.refresh_loading();
        Some((uid, self.epoch))
    }
}

/// Central store over an identity cache and a persistence provider.
///
/// Construct once and share by reference with the UI layer; every action
/// takes `&self` so independent intents can be awaited concurrently.
pub struct YearDataStore<A: AuthProvider, P: PersistenceProvider, C: LocalCache> {
    identity: IdentitySessionCache<A, C>,
    persistence: P,
    inner: Mutex<StoreInner>,
}

impl<A: AuthProvider, P: PersistenceProvider, C: LocalCache> YearDataStore<A, P, C> {
    /// Creates a store positioned on the current local month.
    pub fn new(identity: IdentitySessionCache<A, C>, persistence: P) -> Self {
        let today = chrono::Local::now().date_naive();
        let cursor = CalendarCursor {
            year: today.year(),
            // month0() is 0..=11.
            month: today.month0() as i32,
        };
        Self {
            identity,
            persistence,
            inner: Mutex::new(StoreInner {
                state: StoreState::new(cursor),
                epoch: 0,
                initialized: false,
                next_write_id: 0,
                year_fetches: BTreeMap::new(),
            }),
        }
    }

    /// Repositions the calendar cursor before `init()`.
    pub fn with_cursor(self, year: i32, month: i32) -> StoreResult<Self> {
        validate_year_month(year, month).map_err(ValidationError::InvalidCalendar)?;
        self.inner.lock().state.cursor = CalendarCursor { year, month };
        Ok(self)
    }

    pub fn identity(&self) -> &IdentitySessionCache<A, C> {
        &self.identity
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    // ---- reads ----

    /// Clone of the full state for rendering.
    pub fn snapshot(&self) -> StoreState {
        self.inner.lock().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().state.loading
    }

    pub fn session(&self) -> Session {
        self.inner.lock().state.session.clone()
    }

    pub fn data_keys(&self) -> Vec<DataKey> {
        self.inner.lock().state.data_keys.clone()
    }

    pub fn year(&self) -> i32 {
        self.inner.lock().state.cursor.year
    }

    /// Zero-indexed selected month.
    pub fn month(&self) -> i32 {
        self.inner.lock().state.cursor.month
    }

    /// Grid for the selected month.
    pub fn month_grid(&self) -> StoreResult<MonthGrid> {
        let cursor = self.inner.lock().state.cursor;
        build_month_grid(cursor.year, cursor.month)
            .map_err(|err| ValidationError::InvalidCalendar(err).into())
    }

    /// Date keys recorded for `data_key_id` in the selected year.
    pub fn days_for(&self, data_key_id: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .state
            .year_data_map
            .days_for(inner.state.cursor.year, data_key_id)
            .map(|days| days.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_day(&self, data_key_id: &str, day: DayDate) -> bool {
        self.inner
            .lock()
            .state
            .year_data_map
            .contains_day(data_key_id, day)
    }

    pub fn pending_day_writes(&self) -> Vec<DayWrite> {
        self.inner.lock().state.pending_day_writes.clone()
    }

    /// Anonymous sign-in is offered unless an anonymous session is active.
    pub fn can_sign_in_anonymously(&self) -> bool {
        !self.inner.lock().state.session.is_anon()
    }

    pub fn login_dialog_title(&self) -> &'static str {
        if self.inner.lock().state.session.is_anon() {
            "Link Account"
        } else {
            "Log In Options"
        }
    }

    // ---- lifecycle ----

    /// Restores the session and loads the selected year.
    ///
    /// Commits session, data keys, year data and `loading = false` in one
    /// step at the end. A commit made stale by a concurrent identity change
    /// only clears `loading`. When the cursor moved to an unloaded year in the
    /// meantime, that year is fetched right after the commit.
    pub async fn init(&self) -> StoreResult<()> {
        let (epoch, year) = {
            let inner = self.inner.lock();
            (inner.epoch, inner.state.cursor.year)
        };
        info!("event=store_init module=store status=start year={year}");

        let session = match self.identity.restore() {
            Ok(session) => session,
            Err(err) => {
                error!("event=store_init module=store status=degraded reason=session_restore_failed error={err}");
                Session::logged_out()
            }
        };

        let fetched = match session.user_id() {
            Some(uid) => Some(self.fetch_year(uid, year).await),
            None => None,
        };

        let follow_up = {
            let mut inner = self.inner.lock();
            inner.initialized = true;
            if inner.epoch != epoch {
                inner.refresh_loading();
                info!("event=store_init module=store status=stale");
                return Ok(());
            }

            inner.state.session = session;
            match fetched {
                None => inner.state.year_data_map.merge_year(year, Default::default()),
                Some(Ok(data)) => inner.state.apply_user_year_data(data),
                Some(Err(err)) => {
                    inner.refresh_loading();
                    warn!("event=store_init module=store status=error error={err}");
                    return Err(err);
                }
            }
            inner.refresh_loading();
            info!(
                "event=store_init module=store status=ok state={:?} data_keys={}",
                inner.state.session.state(),
                inner.state.data_keys.len()
            );

            // The cursor may have moved while the session was still unknown.
            let cursor_year = inner.state.cursor.year;
            if inner.needs_year_fetch(cursor_year) {
                inner
                    .register_year_fetch(cursor_year)
                    .map(|(uid, epoch)| (uid, cursor_year, epoch))
            } else {
                None
            }
        };

        match follow_up {
            Some((uid, cursor_year, epoch)) => self.load_year(&uid, cursor_year, epoch).await,
            None => Ok(()),
        }
    }

    // ---- data keys ----

    /// Creates a data key remotely and appends it once the id is known.
    pub async fn add_data_key(&self, label: &str) -> StoreResult<()> {
        let label = normalize_label(label).ok_or(ValidationError::EmptyLabel)?;
        let (epoch, uid) = self.inner.lock().signed_in_user()?;

        let id = self
            .persistence
            .create_data_key(&uid, &label)
            .await
            .map_err(|err| {
                warn!("event=add_data_key module=store status=error error={err}");
                err
            })?;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            info!("event=add_data_key module=store status=stale");
            return Ok(());
        }
        inner.state.push_data_key(DataKey::new(id, label));
        inner.state.dialogs.close_add_data_key();
        info!(
            "event=add_data_key module=store status=ok data_keys={}",
            inner.state.data_keys.len()
        );
        Ok(())
    }

    /// Deletes a data key remotely, then drops it from every cached year.
    pub async fn delete_data_key(&self, data_key_id: &str) -> StoreResult<()> {
        let (epoch, uid) = self.inner.lock().signed_in_user()?;
        self.persistence
            .delete_data_key(&uid, data_key_id)
            .await
            .map_err(|err| {
                warn!("event=delete_data_key module=store status=error error={err}");
                err
            })?;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            info!("event=delete_data_key module=store status=stale");
            return Ok(());
        }
        inner.state.remove_data_key(data_key_id);
        info!("event=delete_data_key module=store status=ok");
        Ok(())
    }

    // ---- day data ----

    /// Records `value` for one day and mirrors it into the cached set.
    ///
    /// # Contract
    /// - Idempotent: repeating the same value never grows the set.
    /// - The day is bucketed under its own year.
    /// - The day-data dialog closes on success only.
    pub async fn add_day_data(
        &self,
        data_key_id: &str,
        day: DayDate,
        value: bool,
    ) -> StoreResult<()> {
        encode_date_key(day).map_err(ValidationError::InvalidDay)?;
        let (epoch, uid, write_id) = {
            let mut inner = self.inner.lock();
            let (epoch, uid) = inner.signed_in_user()?;
            inner.next_write_id += 1;
            let write_id = inner.next_write_id;
            inner.state.pending_day_writes.push(DayWrite {
                id: write_id,
                data_key_id: data_key_id.to_string(),
                day,
                value,
            });
            (epoch, uid, write_id)
        };
        debug!("event=add_day_data module=store status=pending write_id={write_id}");

        let result = self
            .persistence
            .record_day_value(&uid, data_key_id, day, value)
            .await;

        let mut inner = self.inner.lock();
        inner.state.finish_day_write(write_id);
        if let Err(err) = result {
            warn!("event=add_day_data module=store status=error write_id={write_id} error={err}");
            return Err(err.into());
        }
        if inner.epoch != epoch {
            info!("event=add_day_data module=store status=stale write_id={write_id}");
            return Ok(());
        }

        let changed = inner
            .state
            .year_data_map
            .set_day(data_key_id, day, value)
            .map_err(ValidationError::InvalidDay)?;
        inner.state.dialogs.close_day_data();
        debug!("event=add_day_data module=store status=committed write_id={write_id} changed={changed}");
        Ok(())
    }

    /// Deletes one day record remotely, then removes it from the cached set.
    pub async fn delete_day_data(&self, data_key_id: &str, day: DayDate) -> StoreResult<()> {
        encode_date_key(day).map_err(ValidationError::InvalidDay)?;
        let (epoch, uid) = self.inner.lock().signed_in_user()?;

        self.persistence
            .delete_day_value(&uid, data_key_id, day)
            .await
            .map_err(|err| {
                warn!("event=delete_day_data module=store status=error error={err}");
                err
            })?;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            info!("event=delete_day_data module=store status=stale");
            return Ok(());
        }
        inner
            .state
            .year_data_map
            .set_day(data_key_id, day, false)
            .map_err(ValidationError::InvalidDay)?;
        Ok(())
    }

    // ---- year navigation ----

    pub async fn previous_year(&self) -> StoreResult<()> {
        self.shift_year(-1).await
    }

    pub async fn next_year(&self) -> StoreResult<()> {
        self.shift_year(1).await
    }

    /// Selects a zero-indexed month of the current year.
    pub fn set_month(&self, month: i32) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        validate_year_month(inner.state.cursor.year, month)
            .map_err(ValidationError::InvalidCalendar)?;
        inner.state.cursor.month = month;
        Ok(())
    }

    pub fn set_left_scroll(&self, left_scroll: f64) {
        self.inner.lock().state.left_scroll = left_scroll;
    }

    async fn shift_year(&self, delta: i32) -> StoreResult<()> {
        let (year, fetch) = {
            let mut inner = self.inner.lock();
            let year = inner.state.cursor.year + delta;
            validate_year_month(year, inner.state.cursor.month)
                .map_err(ValidationError::InvalidCalendar)?;
            inner.state.cursor.year = year;

            let fetch = if inner.needs_year_fetch(year) {
                inner.register_year_fetch(year)
            } else {
                None
            };
            (year, fetch)
        };

        let Some((uid, epoch)) = fetch else {
            debug!("event=year_fetch module=store status=skipped year={year}");
            return Ok(());
        };
        self.load_year(&uid, year, epoch).await
    }

    /// Fetches a registered year and commits it under `epoch`.
    async fn load_year(&self, uid: &str, year: i32, epoch: u64) -> StoreResult<()> {
        info!("event=year_fetch module=store status=start year={year}");
        let result = self.fetch_year(uid, year).await;

        let mut inner = self.inner.lock();
        if inner.year_fetches.get(&year) == Some(&epoch) {
            inner.year_fetches.remove(&year);
        }
        inner.refresh_loading();
        if inner.epoch != epoch {
            info!("event=year_fetch module=store status=stale year={year}");
            return Ok(());
        }

        match result {
            Ok(data) => {
                inner.state.apply_user_year_data(data);
                info!("event=year_fetch module=store status=ok year={year}");
                Ok(())
            }
            Err(err) => {
                warn!("event=year_fetch module=store status=error year={year} error={err}");
                Err(err)
            }
        }
    }

    async fn fetch_year(&self, uid: &str, year: i32) -> StoreResult<UserYearData> {
        let response = self.persistence.fetch_user_year_data(uid, year).await?;
        Ok(UserYearData::from_response(year, response)?)
    }

    // ---- identity ----

    /// Signs in and loads the selected year for the new identity.
    ///
    /// When an anonymous session signs in interactively as a different user,
    /// the anonymous identity's data is transferred to the new user first.
    pub async fn sign_in(&self, anonymous: bool) -> StoreResult<()> {
        let prior = self.session();
        let session = match self.identity.sign_in(anonymous).await {
            Ok(session) => session,
            Err(err) => {
                self.inner.lock().state.auth_error = Some(err.to_string());
                return Err(err.into());
            }
        };

        let transfer = match (prior.is_anon(), prior.user_id(), session.user_id()) {
            (true, Some(from), Some(to)) if !anonymous && from != to => {
                info!("event=anonymous_transfer module=store status=start");
                let result = self.persistence.transfer_user_data(from, to).await;
                if let Err(err) = &result {
                    warn!("event=anonymous_transfer module=store status=error error={err}");
                }
                result
            }
            _ => Ok(()),
        };

        let (year, fetch) = {
            let mut inner = self.inner.lock();
            inner.begin_epoch(session);
            inner.state.auth_error = None;
            inner.state.dialogs.close_login();
            let year = inner.state.cursor.year;
            (year, inner.register_year_fetch(year))
        };

        let loaded = match fetch {
            Some((uid, epoch)) => self.load_year(&uid, year, epoch).await,
            None => Ok(()),
        };
        transfer?;
        loaded
    }

    /// Signs out, clears the cache and resets every per-user field.
    pub async fn sign_out(&self) -> StoreResult<()> {
        if let Err(err) = self.identity.sign_out().await {
            self.inner.lock().state.auth_error = Some(err.to_string());
            return Err(err.into());
        }
        let mut inner = self.inner.lock();
        inner.begin_epoch(Session::logged_out());
        inner.state.auth_error = None;
        inner.refresh_loading();
        Ok(())
    }

    /// Upgrades the current session using cached tokens. No-op without tokens.
    pub fn link_anonymous_user(&self) -> StoreResult<()> {
        let current = self.session();
        match self.identity.link_anonymous_user(&current) {
            Ok(Some(session)) => {
                let mut inner = self.inner.lock();
                if inner.state.session.user_id() == session.user_id() {
                    inner.state.session = session;
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.inner.lock().state.auth_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn dismiss_auth_error(&self) {
        self.inner.lock().state.auth_error = None;
    }

    // ---- dialogs ----

    pub fn open_login_dialog(&self) {
        self.inner.lock().state.dialogs.open_login();
    }

    pub fn close_login_dialog(&self) {
        self.inner.lock().state.dialogs.close_login();
    }

    pub fn open_add_data_key_dialog(&self) {
        self.inner.lock().state.dialogs.open_add_data_key();
    }

    pub fn close_add_data_key_dialog(&self) {
        self.inner.lock().state.dialogs.close_add_data_key();
    }

    pub fn open_day_data_dialog(
        &self,
        data_key_id: impl Into<DataKeyId>,
        day: DayDate,
        value: bool,
    ) {
        self.inner
            .lock()
            .state
            .dialogs
            .open_day_data(data_key_id.into(), day, value);
    }

    pub fn close_day_data_dialog(&self) {
        self.inner.lock().state.dialogs.close_day_data();
    }
}
