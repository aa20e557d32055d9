//! Errors returned by the Atlas admin client
//!
//! [`AtlasError::Api`] carries what the control plane reported for a
//! non-success response; every other variant is a local or transport failure.

use thiserror::Error;

/// Error from an Atlas admin API interaction
#[derive(Debug, Error)]
pub enum AtlasError {
    /// The configured base URL cannot carry API paths
    #[error("Invalid Atlas base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The underlying HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be sent or the response could not be read
    #[error("Request to Atlas failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Atlas answered with a non-success status
    #[error("Atlas API error {status}{suffix}: {detail}", suffix = code_suffix(.error_code.as_deref()))]
    Api {
        /// HTTP status code
        status: u16,
        /// Atlas error code, e.g. `USERNAME_NOT_FOUND`
        error_code: Option<String>,
        /// Human readable detail from the response body
        detail: String,
    },

    /// The digest challenge was missing or could not be answered
    #[error("Digest authentication failed: {reason}")]
    Digest {
        /// What went wrong during the handshake
        reason: String,
    },

    /// A success response body did not match the expected shape
    #[error("Failed to decode Atlas response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AtlasError {
    /// HTTP status for [`AtlasError::Api`] errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Atlas error code for [`AtlasError::Api`] errors
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }

    /// Whether Atlas reported the addressed resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

/// Result alias for Atlas admin operations
pub type AtlasResult<T> = Result<T, AtlasError>;
