//! The database plugin contract
//!
//! The host drives every database type through [`Database`]: it decides when
//! to issue, renew and revoke credentials, the implementation only talks to
//! the database or its control plane.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::{
    ConfigDocument, CredentialResult, DeleteUserRequest, DeleteUserResponse, InitializeRequest,
    InitializeResponse, NewUserRequest, NewUserResponse, UpdateUserRequest, UpdateUserResponse,
};

/// Lifecycle of dynamic users for one configured connection
#[async_trait]
pub trait Database: Send + Sync {
    /// Decode and store the connection configuration
    async fn initialize(&self, request: InitializeRequest) -> CredentialResult<InitializeResponse>;

    /// Create a user
    async fn new_user(&self, request: NewUserRequest) -> CredentialResult<NewUserResponse>;

    /// Change a user's password or expiration
    async fn update_user(&self, request: UpdateUserRequest)
    -> CredentialResult<UpdateUserResponse>;

    /// Delete a user
    async fn delete_user(&self, request: DeleteUserRequest)
    -> CredentialResult<DeleteUserResponse>;

    /// Rotate the credential the connection itself uses
    async fn rotate_root_credentials(
        &self,
        statements: Vec<String>,
    ) -> CredentialResult<ConfigDocument>;

    /// Database type name
    fn type_name(&self) -> &'static str;

    /// Secret values mapped to the placeholder that replaces them in error text
    async fn secret_values(&self) -> HashMap<String, String>;

    /// Release the connection; configuration is kept
    async fn close(&self) -> CredentialResult<()>;
}
