//! Request and response types of the lifecycle operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::SecretString;

/// Loosely-typed configuration document as stored by the host
pub type ConfigDocument = Map<String, Value>;

/// Input of [`Database::initialize`](crate::Database::initialize)
#[derive(Debug, Clone, Default)]
pub struct InitializeRequest {
    /// Connection configuration
    pub config: ConfigDocument,
    /// Build the client right away and fail if that is impossible
    pub verify_connection: bool,
}

impl InitializeRequest {
    /// Request for a configuration document
    pub fn new(config: ConfigDocument) -> Self {
        Self {
            config,
            verify_connection: false,
        }
    }

    /// Also build the Atlas client during initialize
    pub fn verify_connection(mut self, verify: bool) -> Self {
        self.verify_connection = verify;
        self
    }
}

/// Output of [`Database::initialize`](crate::Database::initialize)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializeResponse {
    /// The configuration document, echoed unchanged
    pub config: ConfigDocument,
}

/// Metadata the username template renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameMetadata {
    /// Display name of the token requesting the credential
    pub display_name: String,
    /// Name of the role the credential is issued for
    pub role_name: String,
}

impl UsernameMetadata {
    /// Metadata for a display name and role name
    pub fn new(display_name: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            role_name: role_name.into(),
        }
    }
}

/// Where the password of a new user comes from
#[derive(Debug, Clone)]
pub enum PasswordSource {
    /// The host generated it; it is not echoed back
    Provided(SecretString),
    /// Generate one with the configured [`PasswordGenerator`](crate::PasswordGenerator)
    /// and return it in the response
    Generate,
}

/// Input of [`Database::new_user`](crate::Database::new_user)
#[derive(Debug, Clone)]
pub struct NewUserRequest {
    /// Username template input
    pub username_config: UsernameMetadata,
    /// Creation statements; only the first is used
    pub statements: Vec<String>,
    /// Password origin
    pub password: PasswordSource,
    /// Lease expiration; Atlas users do not expire, so this is informational
    pub expiration: Option<DateTime<Utc>>,
}

impl NewUserRequest {
    /// Request with a host-provided password
    pub fn new(
        username_config: UsernameMetadata,
        statements: Vec<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        Self {
            username_config,
            statements,
            password: PasswordSource::Provided(password.into()),
            expiration: None,
        }
    }

    /// Request that asks for a generated password
    pub fn generated(username_config: UsernameMetadata, statements: Vec<String>) -> Self {
        Self {
            username_config,
            statements,
            password: PasswordSource::Generate,
            expiration: None,
        }
    }

    /// Set the lease expiration (builder pattern)
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// Output of [`Database::new_user`](crate::Database::new_user)
#[derive(Debug, Clone)]
pub struct NewUserResponse {
    /// Created username
    pub username: String,
    /// Set only when the password was generated here
    pub password: Option<SecretString>,
}

/// Password change part of an update
#[derive(Debug, Clone)]
pub struct ChangePassword {
    /// Replacement password
    pub new_password: SecretString,
}

/// Expiration change part of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeExpiration {
    /// New lease expiration
    pub new_expiration: DateTime<Utc>,
}

/// Input of [`Database::update_user`](crate::Database::update_user)
#[derive(Debug, Clone)]
pub struct UpdateUserRequest {
    /// User to update
    pub username: String,
    /// Password change, if any
    pub password: Option<ChangePassword>,
    /// Expiration change, if any
    pub expiration: Option<ChangeExpiration>,
}

impl UpdateUserRequest {
    /// Update that changes nothing yet
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            expiration: None,
        }
    }

    /// Change the password (builder pattern)
    pub fn with_password(mut self, new_password: impl Into<SecretString>) -> Self {
        self.password = Some(ChangePassword {
            new_password: new_password.into(),
        });
        self
    }

    /// Change the expiration (builder pattern)
    pub fn with_expiration(mut self, new_expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(ChangeExpiration { new_expiration });
        self
    }
}

/// Output of [`Database::update_user`](crate::Database::update_user)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateUserResponse;

/// Input of [`Database::delete_user`](crate::Database::delete_user)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUserRequest {
    /// User to delete
    pub username: String,
}

impl DeleteUserRequest {
    /// Delete `username`
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Output of [`Database::delete_user`](crate::Database::delete_user)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteUserResponse;
