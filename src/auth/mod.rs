//! Authentication: credentials, the `authorize` call, account profile.
//!
//! ## Security Model
//!
//! - The API token is read from the environment (or a `.env` file) and kept
//!   in a private field of the client. It is never exposed via public API and
//!   never printed by `Debug`.
//! - The `app_id` is public: it travels in the connection URL.
//! - The token is sent once per socket in an `authorize` request. After a
//!   reconnect the WS layer replays that request before any queued call.

#[cfg(feature = "ws-native")]
pub mod client;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::shared::serde_util::int_bool;

/// Environment variable holding the registered application id.
pub const APP_ID_VAR: &str = "DERIV_APP_ID";
/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "DERIV_TOKEN";

// ============================================================================
// Credentials
// ============================================================================

/// Application id + API token for one provider session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    token: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            token: token.into(),
        }
    }

    /// Read `DERIV_APP_ID` and `DERIV_TOKEN` from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let creds = Self {
            app_id: read_var(APP_ID_VAR)?,
            token: read_var(TOKEN_VAR)?,
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Load a `.env` file if one exists, then read the environment.
    ///
    /// Variables already set in the environment win over the file.
    pub fn from_dotenv() -> Result<Self, ConfigurationError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_env()
    }

    /// Reject blank fields.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigurationError::Empty(APP_ID_VAR));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigurationError::Empty(TOKEN_VAR));
        }
        Ok(())
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn read_var(name: &'static str) -> Result<String, ConfigurationError> {
    match std::env::var(name) {
        Ok(v) if v.trim().is_empty() => Err(ConfigurationError::Empty(name)),
        Ok(v) => Ok(v.trim().to_string()),
        Err(_) => Err(ConfigurationError::Missing(name)),
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// `{"authorize": "<token>"}`
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizeRequest {
    authorize: String,
}

impl AuthorizeRequest {
    pub fn new(token: &str) -> Self {
        Self {
            authorize: token.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthorizeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizeRequest")
            .field("authorize", &"<redacted>")
            .finish()
    }
}

/// Body of a successful `authorize` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeResponse {
    pub authorize: Account,
}

/// The account the token belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub loginid: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub is_virtual: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub balance: Option<f64>,
}
