//! # Remote Errors
//!
//! Error surface of the remote control plane. Failed calls carry a structured
//! JSON body with a machine-readable code; retry decisions key off that code
//! alone. A body that cannot be parsed yields an error without a code, which
//! no policy ever retries.

use serde::Deserialize;
use thiserror::Error;

/// Error returned by one remote API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The call failed with a structured error body
    #[error("remote API error {code}: {message}")]
    Api {
        /// Machine-readable error code from the response body
        code: String,
        /// Human-readable message from the response body
        message: String,
    },

    /// The call failed without a parseable error body
    ///
    /// Transport failures and malformed bodies land here. No code means no
    /// retry: these classify as fatal.
    #[error("remote call failed: {message}")]
    Unclassified {
        /// Whatever detail was available, often the raw body
        message: String,
    },
}

/// Structured error body as returned by the remote API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

impl RemoteError {
    /// Error with a known machine-readable code
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error without a usable code
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
        }
    }

    /// Extract the error from a raw response body.
    ///
    /// Expects `{"error": {"code": "...", "message": "..."}}`. Anything else
    /// becomes [`RemoteError::Unclassified`] carrying the raw body.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::Api {
                code: parsed.error.code,
                message: parsed
                    .error
                    .message
                    .unwrap_or_else(|| body.trim().to_string()),
            },
            Err(_) => Self::Unclassified {
                message: body.trim().to_string(),
            },
        }
    }

    /// Machine-readable code, if the failure carried one
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::Unclassified { .. } => None,
        }
    }
}
