use serde::{Deserialize, Serialize};
use std::fmt;

/// A database user as exchanged with `groups/{id}/databaseUsers`
///
/// `password` is write-only on the Atlas side: it is sent on create and never
/// returned, so it is skipped when absent and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseUser {
    /// Username, unique per project and authentication database
    pub username: String,

    /// Initial password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authentication database, `admin` for SCRAM users
    pub database_name: String,

    /// Granted roles, in order
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Clusters or data lakes the user is restricted to; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<Scope>,

    /// Owning project, echoed by Atlas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DatabaseUser {
    /// Create a user with a password and authentication database
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            database_name: database_name.into(),
            roles: Vec::new(),
            scopes: Vec::new(),
            group_id: None,
        }
    }

    /// Set granted roles (builder pattern)
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    /// Set scopes (builder pattern)
    pub fn with_scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.scopes = scopes;
        self
    }
}

impl fmt::Debug for DatabaseUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseUser")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database_name", &self.database_name)
            .field("roles", &self.roles)
            .field("scopes", &self.scopes)
            .field("group_id", &self.group_id)
            .finish()
    }
}

/// Partial update body for `PATCH …/databaseUsers/{db}/{username}`
///
/// Only populated fields are sent; Atlas leaves the rest untouched.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseUserUpdate {
    /// Replacement password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl DatabaseUserUpdate {
    /// Update that changes only the password
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }
}

impl fmt::Debug for DatabaseUserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseUserUpdate")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A role grant on a database (and optionally a single collection)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Database the role applies to
    pub database_name: String,

    /// Built-in or custom role name, e.g. `readWriteAnyDatabase`
    pub role_name: String,

    /// Collection the role is limited to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl Role {
    /// Role on a whole database
    pub fn new(database_name: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            role_name: role_name.into(),
            collection_name: None,
        }
    }
}

/// Restricts a user to one cluster or data lake
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Cluster or data lake name
    pub name: String,

    /// Kind of resource named by `name`
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
}

/// Resource kind for a [`Scope`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    /// A database cluster
    Cluster,
    /// An Atlas Data Lake
    DataLake,
}

/// Error document Atlas returns with non-success responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// HTTP status repeated in the body
    #[serde(default)]
    pub error: Option<u16>,

    /// Machine-readable code, e.g. `DUPLICATE_DATABASE_USER`
    #[serde(default)]
    pub error_code: Option<String>,

    /// Human readable description
    #[serde(default)]
    pub detail: Option<String>,

    /// HTTP reason phrase
    #[serde(default)]
    pub reason: Option<String>,
}
