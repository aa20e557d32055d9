//! Creation statements
//!
//! A creation statement is a JSON document naming the authentication database,
//! the roles and optionally the scopes of the user to create:
//!
//! ```json
//! {
//!   "database_name": "admin",
//!   "roles": [{"databaseName": "admin", "roleName": "readWriteAnyDatabase"}],
//!   "scopes": [{"name": "Cluster0", "type": "CLUSTER"}]
//! }
//! ```

use atlas_admin::{Role, Scope};
use serde::{Deserialize, Deserializer};

use crate::core::{CredentialError, CredentialResult};

/// Authentication database used when a statement names none
pub const DEFAULT_AUTH_DATABASE: &str = "admin";

/// Decoded creation statement
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreationStatement {
    /// Authentication database of the user
    #[serde(default, deserialize_with = "null_as_default")]
    pub database_name: String,

    /// Granted roles, in order; never empty after [`CreationStatement::from_statements`]
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<Role>,

    /// Clusters or data lakes the user is limited to
    #[serde(default, deserialize_with = "null_as_default")]
    pub scopes: Vec<Scope>,
}

/// `null` decodes like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CreationStatement {
    /// Decode the first of `statements`
    ///
    /// Fails with [`CredentialError::EmptyStatement`] when there is none,
    /// [`CredentialError::InvalidStatement`] when it does not decode and
    /// [`CredentialError::MissingRoles`] when it grants no role.
    pub fn from_statements(statements: &[String]) -> CredentialResult<Self> {
        let first = statements.first().ok_or(CredentialError::EmptyStatement)?;
        Self::parse(first)
    }

    /// Decode a single statement document
    pub fn parse(statement: &str) -> CredentialResult<Self> {
        let mut decoded: Self = serde_json::from_str(statement)
            .map_err(|source| CredentialError::InvalidStatement { source })?;

        if decoded.database_name.is_empty() {
            decoded.database_name = DEFAULT_AUTH_DATABASE.to_string();
        }
        if decoded.roles.is_empty() {
            return Err(CredentialError::MissingRoles);
        }
        Ok(decoded)
    }
}
