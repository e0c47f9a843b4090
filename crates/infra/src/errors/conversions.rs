//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use virtstat_domain::VirtstatError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub VirtstatError);

impl From<InfraError> for VirtstatError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<VirtstatError> for InfraError {
    fn from(value: VirtstatError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoVirtstatError {
    fn into_virtstat(self) -> VirtstatError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → VirtstatError */
/* -------------------------------------------------------------------------- */

impl IntoVirtstatError for HttpError {
    fn into_virtstat(self) -> VirtstatError {
        if self.is_timeout() {
            return VirtstatError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return VirtstatError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return VirtstatError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return match code {
                401 | 403 => VirtstatError::Auth(message),
                _ => VirtstatError::Network(message),
            };
        }

        VirtstatError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_virtstat())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
