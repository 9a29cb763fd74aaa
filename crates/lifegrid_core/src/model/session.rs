//! Identity session model.
//!
//! # Responsibility
//! - Hold the current user and OAuth token pair.
//! - Derive authentication flags from the stored parts.
//!
//! # Invariants
//! - `is_authed()` holds iff a user exists.
//! - `is_anon()` holds iff a user exists and neither token is present.
//! - Flags are computed, never stored, so they cannot drift from the parts.

use serde::{Deserialize, Serialize};

/// Identity record returned by the auth provider and cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }
}

/// Coarse session state used by UI and state-machine checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    AnonymousSignedIn,
    AuthenticatedSignedIn,
}

/// Current identity and token state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    id_token: Option<String>,
    access_token: Option<String>,
}

impl Session {
    /// Logged-out session.
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Builds a session from its parts. Empty token strings count as absent.
    pub fn new(user: Option<User>, id_token: Option<String>, access_token: Option<String>) -> Self {
        Self {
            user,
            id_token: id_token.filter(|token| !token.is_empty()),
            access_token: access_token.filter(|token| !token.is_empty()),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.uid.as_str())
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn has_tokens(&self) -> bool {
        self.id_token.is_some() || self.access_token.is_some()
    }

    pub fn is_authed(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_anon(&self) -> bool {
        self.user.is_some() && !self.has_tokens()
    }

    pub fn state(&self) -> SessionState {
        match (self.is_authed(), self.is_anon()) {
            (false, _) => SessionState::LoggedOut,
            (true, true) => SessionState::AnonymousSignedIn,
            (true, false) => SessionState::AuthenticatedSignedIn,
        }
    }
}
