//! Identity provider contract.

use crate::model::session::User;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Provider-level authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    /// Stable machine-readable code, e.g. `popup_closed`.
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "auth failed [{}]: {}", self.code, self.message)
    }
}

impl Error for AuthError {}

/// OAuth token pair derived by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthCredential {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

/// Identity returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub user: User,
    /// `None` for anonymous sign-in.
    pub credential: Option<OAuthCredential>,
}

/// Remote identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Creates an anonymous identity with no credential.
    async fn sign_in_anonymous(&self) -> Result<SignInResult, AuthError>;

    /// Runs the interactive account flow and returns a credential.
    async fn sign_in_interactive(&self) -> Result<SignInResult, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Rebuilds a credential from cached tokens. May refresh token values.
    fn credential_from_tokens(
        &self,
        id_token: Option<&str>,
        access_token: Option<&str>,
    ) -> OAuthCredential;
}
