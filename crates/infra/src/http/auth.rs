//! Scrape authentication middleware
//!
//! Status codes follow what Prometheus operators expect from an OpenStack
//! exporter: no token is 401, a token Keystone rejects is 404, and an
//! unreachable Keystone is 503.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::server::AppState;
use crate::keystone::AuthError;

const AUTH_TOKEN_HEADER: &str = "x-auth-token";

pub async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(validator) = state.validator.as_ref() else {
        return next.run(request).await;
    };

    let Some(token) = request_token(request.headers()) else {
        debug!("Scrape without token");
        return status_for(&AuthError::MissingToken).into_response();
    };

    match validator.validate(&token).await {
        Ok(()) => next.run(request).await,
        Err(err) => {
            match &err {
                AuthError::Unavailable(reason) => warn!(reason = %reason, "Cannot validate scrape token"),
                _ => debug!(error = %err, "Scrape token refused"),
            }
            status_for(&err).into_response()
        }
    }
}

/// `X-Auth-Token`, or the token of an `Authorization: Bearer` header.
fn request_token(headers: &HeaderMap) -> Option<String> {
    let from_auth_header = headers.get(AUTH_TOKEN_HEADER).and_then(|value| value.to_str().ok());
    let from_bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    };

    from_auth_header
        .or_else(from_bearer)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingToken => StatusCode::UNAUTHORIZED,
        AuthError::InvalidToken => StatusCode::NOT_FOUND,
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
