use std::error::Error;
use std::fmt;

use warp::reject::Reject;

use crate::constants::{ERROR_CANCELLED, ERROR_PROVIDER_UNAVAILABLE, ERROR_TIMEOUT};

/// Error type for the relay server
#[derive(Debug, Clone)]
pub struct RelayError {
    pub message: String,
    pub status_code: u16,
    kind: RelayErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RelayErrorKind {
    RequestCancelled,
    InternalServerError,
    ProviderAuthentication,
    ProviderUnavailable,
    ProviderTimeout,
    ProviderResponse,
}

impl RelayError {
    pub fn internal_server_error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status_code: 500,
            kind: RelayErrorKind::InternalServerError,
        }
    }

    pub fn request_cancelled() -> Self {
        Self {
            message: ERROR_CANCELLED.to_string(),
            status_code: 499,
            kind: RelayErrorKind::RequestCancelled,
        }
    }

    /// Missing secret, or one the provider refused.
    pub fn provider_authentication(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status_code: 502,
            kind: RelayErrorKind::ProviderAuthentication,
        }
    }

    pub fn provider_unavailable(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status_code: 503,
            kind: RelayErrorKind::ProviderUnavailable,
        }
    }

    pub fn provider_timeout() -> Self {
        Self {
            message: ERROR_TIMEOUT.to_string(),
            status_code: 504,
            kind: RelayErrorKind::ProviderTimeout,
        }
    }

    pub fn provider_response(message: String) -> Self {
        Self {
            message,
            status_code: 502,
            kind: RelayErrorKind::ProviderResponse,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == RelayErrorKind::RequestCancelled
    }

    pub fn is_provider_authentication(&self) -> bool {
        self.kind == RelayErrorKind::ProviderAuthentication
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelayError {}: {}", self.status_code, self.message)
    }
}

impl Error for RelayError {}

impl Reject for RelayError {}

impl From<RelayError> for std::io::Error {
    fn from(err: RelayError) -> Self {
        std::io::Error::other(err)
    }
}

/// Maps a transport failure from reqwest onto the relay taxonomy.
pub fn map_reqwest_error(provider: &str, err: reqwest::Error) -> RelayError {
    if err.is_connect() {
        log::error!("{} unreachable: {}", provider, err);
        RelayError::provider_unavailable(ERROR_PROVIDER_UNAVAILABLE)
    } else if err.is_timeout() {
        RelayError::provider_timeout()
    } else if err.is_decode() {
        RelayError::provider_response(format!("{} sent an unreadable response: {}", provider, err))
    } else {
        log::error!("{} request failed: {}", provider, err);
        RelayError::provider_response(format!("{} request failed: {}", provider, err))
    }
}

#[macro_export]
macro_rules! check_cancelled {
    ($token:expr) => {
        if $token.is_cancelled() {
            return Err($crate::error::RelayError::request_cancelled());
        }
    };
}
