//! Error types for credential lifecycle operations
//!
//! - [`CredentialError`]: everything a lifecycle operation can fail with
//! - [`ConfigError`]: configuration document decoding and validation
//!
//! Remote failures keep the [`AtlasError`] as their source so callers can
//! inspect the HTTP status and Atlas error code.
//!
//! ```
//! use atlas_credential::{ConfigError, CredentialError};
//!
//! let err: CredentialError = ConfigError::MissingRequired {
//!     field: "public_key".to_string(),
//! }
//! .into();
//! assert!(err.to_string().contains("public_key"));
//! ```

use atlas_admin::AtlasError;
use thiserror::Error;

/// Result alias for lifecycle operations
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Lifecycle operation error
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// An operation needed the session before `initialize` succeeded
    #[error("Session is not initialized")]
    NotInitialized,

    /// The Atlas client could not be constructed
    #[error("Failed to create Atlas client: {source}")]
    Transport {
        /// Underlying client error
        #[source]
        source: AtlasError,
    },

    /// No creation statement was supplied
    #[error("No creation statements provided")]
    EmptyStatement,

    /// The first creation statement is not a valid statement document
    #[error("Error unmarshalling creation statement: {source}")]
    InvalidStatement {
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// The creation statement granted no roles
    #[error("roles array is required in creation statement")]
    MissingRoles,

    /// Username generation failed or produced nothing usable
    #[error("Invalid username: {reason}")]
    InvalidUsername {
        /// What went wrong
        reason: String,
    },

    /// The password generator could not produce a password
    #[error("Password generation failed: {reason}")]
    PasswordGeneration {
        /// What went wrong
        reason: String,
    },

    /// The Atlas API rejected or failed the call
    #[error("Atlas API call failed: {source}")]
    Remote {
        /// Underlying API error
        #[source]
        source: AtlasError,
    },

    /// Operation not supported by this database type
    #[error("{operation} is not currently implemented in this database secrets engine")]
    NotImplemented {
        /// Operation name
        operation: &'static str,
    },

    /// Error text with secret values replaced by placeholders
    #[error("{message}")]
    Redacted {
        /// Sanitized error text
        message: String,
    },
}

impl CredentialError {
    /// HTTP status of the underlying Atlas error, if any
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            Self::Remote { source } | Self::Transport { source } => source.status(),
            _ => None,
        }
    }

    pub(crate) fn remote(source: AtlasError) -> Self {
        Self::Remote { source }
    }
}

/// Configuration document errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is missing or empty
    #[error("Missing required field: {field}")]
    MissingRequired {
        /// Field name
        field: String,
    },

    /// A field has a value of the wrong shape or an invalid value
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequired { field } | Self::InvalidValue { field, .. } => field,
        }
    }
}
