//! OpenStack Keystone token validation
//!
//! The exposition endpoint can be protected by Keystone: every scrape
//! carries a user token, which is checked against the identity service
//! with the exporter's own service token.
//!
//! - `client`: service authentication and `GET /v3/auth/tokens`
//! - `validator`: the client behind a TTL cache

pub mod client;
pub mod validator;

use async_trait::async_trait;
use thiserror::Error;
use virtstat_domain::VirtstatError;

pub use client::KeystoneClient;
pub use validator::KeystoneValidator;

/// Why a scrape was not authorized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The request carried no token
    #[error("no authentication token supplied")]
    MissingToken,

    /// Keystone does not know the token, or it expired
    #[error("token rejected by identity service")]
    InvalidToken,

    /// Keystone could not be asked
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for VirtstatError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unavailable(_) => Self::Network(err.to_string()),
            AuthError::MissingToken | AuthError::InvalidToken => Self::Auth(err.to_string()),
        }
    }
}

/// Decides whether a user token may scrape.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// # Errors
    /// `InvalidToken` when the token is not accepted, `Unavailable` when
    /// the decision could not be made.
    async fn validate(&self, token: &str) -> Result<(), AuthError>;
}
