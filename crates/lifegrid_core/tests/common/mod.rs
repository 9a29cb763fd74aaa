#![allow(dead_code)]

use async_trait::async_trait;
use lifegrid_core::{
    encode_date_key, AuthError, AuthProvider, DataKey, DayDate, IdentitySessionCache,
    MemoryCache, OAuthCredential, PersistenceError, PersistenceProvider, PersistenceResult,
    SignInResult, User, YearDataStore,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const INTERACTIVE_UID: &str = "user-1";
pub const ID_TOKEN: &str = "id-token-1";
pub const ACCESS_TOKEN: &str = "access-token-1";

pub type TestStore = YearDataStore<FakeAuth, FakePersistence, MemoryCache>;

/// Store positioned on January of `year`, not yet initialized.
pub fn store_at(year: i32, auth: FakeAuth, persistence: FakePersistence) -> TestStore {
    store_with_cache(year, auth, persistence, MemoryCache::new())
}

pub fn store_with_cache(
    year: i32,
    auth: FakeAuth,
    persistence: FakePersistence,
    cache: MemoryCache,
) -> TestStore {
    YearDataStore::new(IdentitySessionCache::new(auth, cache), persistence)
        .with_cursor(year, 0)
        .unwrap()
}

pub fn day(year: i32, month: i32, day: i32) -> DayDate {
    DayDate::new(year, month, day).unwrap()
}

#[derive(Debug)]
pub struct FakeAuth {
    interactive_uid: Mutex<String>,
    sign_in_error: Mutex<Option<AuthError>>,
    sign_out_error: Mutex<Option<AuthError>>,
    refreshed_access_token: Mutex<Option<String>>,
    sign_in_calls: AtomicUsize,
}

impl Default for FakeAuth {
    fn default() -> Self {
        Self {
            interactive_uid: Mutex::new(INTERACTIVE_UID.to_string()),
            sign_in_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            refreshed_access_token: Mutex::new(None),
            sign_in_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following sign-in fail with `code`.
    pub fn fail_sign_in(&self, code: &str) {
        *self.sign_in_error.lock() = Some(AuthError::new(code, "sign-in rejected"));
    }

    pub fn fail_sign_out(&self, code: &str) {
        *self.sign_out_error.lock() = Some(AuthError::new(code, "sign-out rejected"));
    }

    pub fn set_interactive_uid(&self, uid: &str) {
        *self.interactive_uid.lock() = uid.to_string();
    }

    /// Access token returned by the next credential re-derivation.
    pub fn refresh_access_token_to(&self, token: &str) {
        *self.refreshed_access_token.lock() = Some(token.to_string());
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    fn check_sign_in(&self) -> Result<(), AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        match self.sign_in_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in_anonymous(&self) -> Result<SignInResult, AuthError> {
        self.check_sign_in()?;
        Ok(SignInResult {
            user: User::new(format!("anon-{}", uuid::Uuid::new_v4())),
            credential: None,
        })
    }

    async fn sign_in_interactive(&self) -> Result<SignInResult, AuthError> {
        self.check_sign_in()?;
        let mut user = User::new(self.interactive_uid.lock().clone());
        user.display_name = Some("Test User".to_string());
        user.email = Some("test@example.com".to_string());
        Ok(SignInResult {
            user,
            credential: Some(OAuthCredential {
                id_token: Some(ID_TOKEN.to_string()),
                access_token: Some(ACCESS_TOKEN.to_string()),
            }),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        match self.sign_out_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn credential_from_tokens(
        &self,
        id_token: Option<&str>,
        access_token: Option<&str>,
    ) -> OAuthCredential {
        let refreshed = self.refreshed_access_token.lock().clone();
        OAuthCredential {
            id_token: id_token.map(str::to_string),
            access_token: refreshed.or_else(|| access_token.map(str::to_string)),
        }
    }
}

#[derive(Debug, Default)]
struct RemoteData {
    data_keys: BTreeMap<String, Vec<DataKey>>,
    /// uid -> data key id -> date keys recorded true.
    days: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

/// In-memory persistence with per-call delays, counters and failure toggles.
#[derive(Debug, Default)]
pub struct FakePersistence {
    remote: Mutex<RemoteData>,
    calls: Mutex<BTreeMap<&'static str, usize>>,
    fail_writes: AtomicBool,
    fail_fetches: AtomicBool,
    fetch_delay: Mutex<Duration>,
    day_delays: Mutex<BTreeMap<String, Duration>>,
    raw_fetch_response: Mutex<Option<Value>>,
}

impl FakePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_data_key(&self, uid: &str, id: &str, label: &str) {
        self.remote
            .lock()
            .data_keys
            .entry(uid.to_string())
            .or_default()
            .push(DataKey::new(id, label));
    }

    pub fn seed_day(&self, uid: &str, data_key_id: &str, day: DayDate) {
        self.remote
            .lock()
            .days
            .entry(uid.to_string())
            .or_default()
            .entry(data_key_id.to_string())
            .or_default()
            .insert(encode_date_key(day).unwrap());
    }

    pub fn remote_days(&self, uid: &str, data_key_id: &str) -> BTreeSet<String> {
        self.remote
            .lock()
            .days
            .get(uid)
            .and_then(|keys| keys.get(data_key_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn remote_data_keys(&self, uid: &str) -> Vec<DataKey> {
        self.remote
            .lock()
            .data_keys
            .get(uid)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = delay;
    }

    /// Delays `record_day_value` for `day` by `delay`.
    pub fn delay_day(&self, day: DayDate, delay: Duration) {
        self.day_delays
            .lock()
            .insert(encode_date_key(day).unwrap(), delay);
    }

    /// Answers every fetch with `response` verbatim.
    pub fn respond_with(&self, response: Value) {
        *self.raw_fetch_response.lock() = Some(response);
    }

    fn record_call(&self, name: &'static str) {
        *self.calls.lock().entry(name).or_default() += 1;
    }

    fn check_write(&self) -> PersistenceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::remote("unavailable", "write rejected"));
        }
        Ok(())
    }

    fn year_response(&self, uid: &str, year: i32) -> Value {
        if let Some(response) = self.raw_fetch_response.lock().clone() {
            return response;
        }
        let remote = self.remote.lock();
        let prefix = format!("{year:04}_");
        let mut year_data = Map::new();
        for (data_key_id, days) in remote.days.get(uid).into_iter().flatten() {
            let entries: Map<String, Value> = days
                .iter()
                .filter(|key| key.starts_with(&prefix))
                .map(|key| (key.clone(), Value::Bool(true)))
                .collect();
            year_data.insert(data_key_id.clone(), Value::Object(entries));
        }
        json!({
            "dataKeys": remote.data_keys.get(uid).cloned().unwrap_or_default(),
            "yearData": year_data,
        })
    }
}

#[async_trait]
impl PersistenceProvider for FakePersistence {
    async fn create_data_key(&self, user_id: &str, label: &str) -> PersistenceResult<String> {
        self.record_call("create_data_key");
        self.check_write()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.seed_data_key(user_id, &id, label);
        Ok(id)
    }

    async fn record_day_value(
        &self,
        user_id: &str,
        data_key_id: &str,
        day: DayDate,
        value: bool,
    ) -> PersistenceResult<()> {
        self.record_call("record_day_value");
        let key = encode_date_key(day).unwrap();
        let delay = self.day_delays.lock().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_write()?;

        let mut remote = self.remote.lock();
        let days = remote
            .days
            .entry(user_id.to_string())
            .or_default()
            .entry(data_key_id.to_string())
            .or_default();
        if value {
            days.insert(key);
        } else {
            days.remove(&key);
        }
        Ok(())
    }

    async fn fetch_user_year_data(&self, user_id: &str, year: i32) -> PersistenceResult<Value> {
        self.record_call("fetch_user_year_data");
        let delay = *self.fetch_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(PersistenceError::remote("unavailable", "fetch rejected"));
        }
        Ok(self.year_response(user_id, year))
    }

    async fn delete_data_key(&self, user_id: &str, data_key_id: &str) -> PersistenceResult<()> {
        self.record_call("delete_data_key");
        self.check_write()?;
        let mut remote = self.remote.lock();
        if let Some(keys) = remote.data_keys.get_mut(user_id) {
            keys.retain(|key| key.id != data_key_id);
        }
        if let Some(days) = remote.days.get_mut(user_id) {
            days.remove(data_key_id);
        }
        Ok(())
    }

    async fn delete_day_value(
        &self,
        user_id: &str,
        data_key_id: &str,
        day: DayDate,
    ) -> PersistenceResult<()> {
        self.record_call("delete_day_value");
        self.check_write()?;
        let key = encode_date_key(day).unwrap();
        if let Some(days) = self
            .remote
            .lock()
            .days
            .get_mut(user_id)
            .and_then(|keys| keys.get_mut(data_key_id))
        {
            days.remove(&key);
        }
        Ok(())
    }

    async fn transfer_user_data(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> PersistenceResult<()> {
        self.record_call("transfer_user_data");
        self.check_write()?;
        let mut remote = self.remote.lock();
        let keys = remote.data_keys.remove(from_user_id).unwrap_or_default();
        remote
            .data_keys
            .entry(to_user_id.to_string())
            .or_default()
            .extend(keys);
        let days = remote.days.remove(from_user_id).unwrap_or_default();
        let target = remote.days.entry(to_user_id.to_string()).or_default();
        for (data_key_id, entries) in days {
            target.entry(data_key_id).or_default().extend(entries);
        }
        Ok(())
    }
}
