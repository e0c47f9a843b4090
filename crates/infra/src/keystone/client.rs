//! Keystone v3 identity client
//!
//! Holds the exporter's service token and validates user tokens with it.
//! The service token is requested lazily and requested again once Keystone
//! reports it expired.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use virtstat_domain::{AuthenticationConfig, KeystoneConfig, Result, VirtstatError};

use super::AuthError;
use crate::errors::InfraError;

/// Header carrying the caller's token, and on responses the issued token.
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one validation round trip.
enum Validation {
    Valid,
    Rejected,
    ServiceTokenExpired,
}

/// Client for the Keystone token API.
pub struct KeystoneClient {
    http: Client,
    tokens_url: String,
    credentials: AuthenticationConfig,
    service_token: RwLock<Option<String>>,
}

impl KeystoneClient {
    /// Build a client for `config.auth_url`.
    ///
    /// # Errors
    /// Returns `VirtstatError::Config` if the HTTP client cannot be built.
    pub fn new(config: &KeystoneConfig, credentials: AuthenticationConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VirtstatError::from(InfraError::from(e)))?;

        Ok(Self {
            http,
            tokens_url: tokens_url(&config.auth_url),
            credentials,
            service_token: RwLock::new(None),
        })
    }

    /// Ask Keystone whether `token` is valid.
    ///
    /// # Errors
    /// `InvalidToken` when Keystone answers 404, `Unavailable` for any
    /// transport failure, unexpected status or failed service login.
    pub async fn check_token(&self, token: &str) -> std::result::Result<(), AuthError> {
        let service_token = self.service_token().await?;

        match self.validate_with(&service_token, token).await? {
            Validation::Valid => return Ok(()),
            Validation::Rejected => return Err(AuthError::InvalidToken),
            Validation::ServiceTokenExpired => {
                info!("Keystone service token expired, authenticating again");
            }
        }

        let service_token = self.refresh_service_token(&service_token).await?;
        match self.validate_with(&service_token, token).await? {
            Validation::Valid => Ok(()),
            Validation::Rejected => Err(AuthError::InvalidToken),
            Validation::ServiceTokenExpired => {
                Err(AuthError::Unavailable("fresh service token was rejected".into()))
            }
        }
    }

    async fn service_token(&self) -> std::result::Result<String, AuthError> {
        if let Some(token) = self.service_token.read().await.as_ref() {
            return Ok(token.clone());
        }
        self.refresh_service_token("").await
    }

    /// Replace `stale` with a new service token, unless another task already
    /// did.
    async fn refresh_service_token(&self, stale: &str) -> std::result::Result<String, AuthError> {
        let mut slot = self.service_token.write().await;
        if let Some(current) = slot.as_ref() {
            if current != stale {
                return Ok(current.clone());
            }
        }

        let token = self.authenticate().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn authenticate(&self) -> std::result::Result<String, AuthError> {
        debug!(url = %self.tokens_url, "Requesting Keystone service token");

        let response = self
            .http
            .post(&self.tokens_url)
            .json(&auth_request(&self.credentials))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Keystone refused the service credentials");
            return Err(AuthError::Unavailable(format!("service authentication failed: {status}")));
        }

        response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AuthError::Unavailable(format!("response has no {SUBJECT_TOKEN_HEADER}")))
    }

    async fn validate_with(
        &self,
        service_token: &str,
        token: &str,
    ) -> std::result::Result<Validation, AuthError> {
        let response = self
            .http
            .get(&self.tokens_url)
            .header(AUTH_TOKEN_HEADER, service_token)
            .header(SUBJECT_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            status if status.is_success() => Ok(Validation::Valid),
            StatusCode::NOT_FOUND => Ok(Validation::Rejected),
            StatusCode::UNAUTHORIZED => Ok(Validation::ServiceTokenExpired),
            status => {
                warn!(%status, "Unexpected Keystone validation response");
                Err(AuthError::Unavailable(format!("token validation returned {status}")))
            }
        }
    }
}

/// `{auth_url}/v3/auth/tokens`, whether or not `auth_url` already names the
/// v3 API.
fn tokens_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        format!("{base}/auth/tokens")
    } else {
        format!("{base}/v3/auth/tokens")
    }
}

fn auth_request(credentials: &AuthenticationConfig) -> Value {
    match credentials {
        AuthenticationConfig::Password {
            username,
            password,
            user_domain_name,
            project_name,
            project_domain_name,
        } => {
            let mut auth = json!({
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": username,
                            "domain": { "name": user_domain_name },
                            "password": password,
                        }
                    }
                }
            });
            if let Some(project) = project_name {
                auth["scope"] = json!({
                    "project": { "name": project, "domain": { "name": project_domain_name } }
                });
            }
            json!({ "auth": auth })
        }
        AuthenticationConfig::ApplicationCredential {
            application_credential_id,
            application_credential_secret,
        } => json!({
            "auth": {
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": {
                        "id": application_credential_id,
                        "secret": application_credential_secret,
                    }
                }
            }
        }),
    }
}

fn unavailable(err: reqwest::Error) -> AuthError {
    AuthError::Unavailable(VirtstatError::from(InfraError::from(err)).to_string())
}
