//! Session reconciliation between local cache and auth provider.
//!
//! # Responsibility
//! - Rebuild the session from the durable cache at process start.
//! - Persist identity changes produced by the auth provider.
//!
//! # Invariants
//! - The cache holds either a complete identity (user plus the tokens of that
//!   identity) or nothing; anonymous sign-in removes stale tokens.
//! - A provider failure never touches the cache.
//! - Token values are cached raw (no JSON quoting).
//! - Logs carry state names and error codes only, never tokens.

use crate::cache::{CacheError, CacheResult, LocalCache, ACCESS_TOKEN_KEY, ID_TOKEN_KEY, USER_KEY};
use crate::model::session::{Session, User};
use crate::provider::auth::{AuthError, AuthProvider, OAuthCredential};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity cache failures.
#[derive(Debug)]
pub enum IdentityError {
    Auth(AuthError),
    Cache(CacheError),
    /// The user record could not be encoded for the cache.
    UserRecord(serde_json::Error),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::UserRecord(err) => write!(f, "user record encoding failed: {err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Cache(err) => Some(err),
            Self::UserRecord(err) => Some(err),
        }
    }
}

impl From<AuthError> for IdentityError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<CacheError> for IdentityError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Session reconciliation service over an auth provider and a local cache.
pub struct IdentitySessionCache<A: AuthProvider, C: LocalCache> {
    auth: A,
    cache: C,
}

impl<A: AuthProvider, C: LocalCache> IdentitySessionCache<A, C> {
    pub fn new(auth: A, cache: C) -> Self {
        Self { auth, cache }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Rebuilds the session from cached user and tokens.
    ///
    /// # Contract
    /// - No cached user yields a logged-out session.
    /// - When any token is cached, a credential is re-derived and changed
    ///   token values are written back.
    pub fn restore(&self) -> IdentityResult<Session> {
        let user = self.read_user()?;
        let (id_token, access_token) = self.read_tokens()?;
        let (id_token, access_token) = if id_token.is_some() || access_token.is_some() {
            self.refresh_tokens(id_token, access_token)?
        } else {
            (None, None)
        };

        let session = Session::new(user, id_token, access_token);
        info!(
            "event=session_restore module=identity status=ok state={:?}",
            session.state()
        );
        Ok(session)
    }

    /// Signs in through the provider and persists the new identity.
    ///
    /// # Errors
    /// - `IdentityError::Auth` when the provider fails; cache untouched.
    /// - `IdentityError::Cache` when persisting fails; partial writes are
    ///   rolled back.
    pub async fn sign_in(&self, anonymous: bool) -> IdentityResult<Session> {
        let mode = if anonymous { "anonymous" } else { "interactive" };
        info!("event=sign_in module=identity status=start mode={mode}");

        let result = if anonymous {
            self.auth.sign_in_anonymous().await
        } else {
            self.auth.sign_in_interactive().await
        };
        let result = result.map_err(|err| {
            warn!(
                "event=sign_in module=identity status=error mode={mode} error_code={}",
                err.code
            );
            IdentityError::Auth(err)
        })?;

        let credential = result.credential.unwrap_or_default();
        if let Err(err) = self.persist_identity(&result.user, &credential) {
            warn!("event=sign_in module=identity status=error mode={mode} error_code=cache_write_failed");
            self.clear_cache_best_effort();
            return Err(err);
        }

        let session = Session::new(
            Some(result.user),
            credential.id_token,
            credential.access_token,
        );
        info!(
            "event=sign_in module=identity status=ok mode={mode} state={:?}",
            session.state()
        );
        Ok(session)
    }

    /// Signs out through the provider and clears every cached entry.
    pub async fn sign_out(&self) -> IdentityResult<()> {
        if let Err(err) = self.auth.sign_out().await {
            warn!(
                "event=sign_out module=identity status=error error_code={}",
                err.code
            );
            return Err(err.into());
        }
        self.clear_cache()?;
        info!("event=sign_out module=identity status=ok");
        Ok(())
    }

    /// Upgrades `current` to an authenticated session from cached tokens.
    ///
    /// Returns `Ok(None)` when no tokens are cached or `current` has no user.
    /// The user id is preserved, so linking never moves remote data.
    pub fn link_anonymous_user(&self, current: &Session) -> IdentityResult<Option<Session>> {
        let Some(user) = current.user() else {
            debug!("event=link_anonymous module=identity status=skipped reason=no_user");
            return Ok(None);
        };
        let (id_token, access_token) = self.read_tokens()?;
        if id_token.is_none() && access_token.is_none() {
            debug!("event=link_anonymous module=identity status=skipped reason=no_cached_tokens");
            return Ok(None);
        }

        let (id_token, access_token) = self.refresh_tokens(id_token, access_token)?;
        let session = Session::new(Some(user.clone()), id_token, access_token);
        info!(
            "event=link_anonymous module=identity status=ok state={:?}",
            session.state()
        );
        Ok(Some(session))
    }

    fn read_user(&self) -> IdentityResult<Option<User>> {
        let Some(raw) = self.cache.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(
                    "event=session_restore module=identity status=degraded reason=invalid_user_record error={err}"
                );
                Ok(None)
            }
        }
    }

    fn read_tokens(&self) -> CacheResult<(Option<String>, Option<String>)> {
        let id_token = self.cache.get(ID_TOKEN_KEY)?.filter(|token| !token.is_empty());
        let access_token = self
            .cache
            .get(ACCESS_TOKEN_KEY)?
            .filter(|token| !token.is_empty());
        Ok((id_token, access_token))
    }

    fn refresh_tokens(
        &self,
        id_token: Option<String>,
        access_token: Option<String>,
    ) -> CacheResult<(Option<String>, Option<String>)> {
        let credential = self
            .auth
            .credential_from_tokens(id_token.as_deref(), access_token.as_deref());
        let id_token = self.write_back(ID_TOKEN_KEY, id_token, credential.id_token)?;
        let access_token = self.write_back(ACCESS_TOKEN_KEY, access_token, credential.access_token)?;
        Ok((id_token, access_token))
    }

    fn write_back(
        &self,
        key: &str,
        cached: Option<String>,
        derived: Option<String>,
    ) -> CacheResult<Option<String>> {
        match derived.filter(|token| !token.is_empty()) {
            Some(fresh) => {
                if cached.as_deref() != Some(fresh.as_str()) {
                    self.cache.set(key, &fresh)?;
                    debug!("event=token_refresh module=identity status=ok key={key}");
                }
                Ok(Some(fresh))
            }
            None => Ok(cached),
        }
    }

    fn persist_identity(&self, user: &User, credential: &OAuthCredential) -> IdentityResult<()> {
        let record = serde_json::to_string(user).map_err(IdentityError::UserRecord)?;
        self.cache.set(USER_KEY, &record)?;
        self.store_token(ID_TOKEN_KEY, credential.id_token.as_deref())?;
        self.store_token(ACCESS_TOKEN_KEY, credential.access_token.as_deref())?;
        Ok(())
    }

    fn store_token(&self, key: &str, token: Option<&str>) -> CacheResult<()> {
        match token.filter(|token| !token.is_empty()) {
            Some(token) => self.cache.set(key, token),
            None => self.cache.remove(key),
        }
    }

    fn clear_cache(&self) -> CacheResult<()> {
        let mut first_error = None;
        for key in [USER_KEY, ID_TOKEN_KEY, ACCESS_TOKEN_KEY] {
            if let Err(err) = self.cache.remove(key) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn clear_cache_best_effort(&self) {
        if let Err(err) = self.clear_cache() {
            warn!("event=cache_rollback module=identity status=error error={err}");
        }
    }
}
