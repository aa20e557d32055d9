//! Credential lifecycle for MongoDB Atlas database users
//!
//! [`AtlasDatabase`] implements [`Database`] on top of a [`Session`]. Every
//! operation holds the session lock from client lookup to the end of its
//! remote call, so operations on one connection run one at a time. Remote
//! calls are attempted once; failures are returned as they come.
//!
//! # Example
//!
//! ```no_run
//! use atlas_credential::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), CredentialError> {
//! let db = AtlasDatabase::new();
//!
//! let config = json!({
//!     "public_key": "abcd1234",
//!     "private_key": "00000000-0000-0000-0000-000000000000",
//!     "project_id": "5f1a...",
//! });
//! let serde_json::Value::Object(config) = config else { unreachable!() };
//! db.initialize(InitializeRequest::new(config)).await?;
//!
//! let created = db
//!     .new_user(NewUserRequest::generated(
//!         UsernameMetadata::new("token", "reporting"),
//!         vec![r#"{"roles":[{"databaseName":"admin","roleName":"read"}]}"#.to_string()],
//!     ))
//!     .await?;
//!
//! db.delete_user(DeleteUserRequest::new(created.username)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use atlas_admin::{DatabaseUser, DatabaseUserUpdate};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::core::{
    ConfigDocument, CreationStatement, CredentialError, CredentialResult, DEFAULT_AUTH_DATABASE,
    DeleteUserRequest, DeleteUserResponse, InitializeRequest, InitializeResponse,
    NewUserRequest, NewUserResponse, PasswordSource, SessionConfig, UpdateUserRequest,
    UpdateUserResponse,
};
use crate::password::{PasswordGenerator, PasswordPolicy};
use crate::session::{ClientFactory, Session};
use crate::traits::Database;
use crate::utils::SecretString;

/// Type name reported to the host
pub const TYPE_NAME: &str = "mongodbatlas";

/// Placeholder that replaces the private key in error text
pub const PRIVATE_KEY_PLACEHOLDER: &str = "[private_key]";

/// Dynamic Atlas database users for one configured project
#[derive(Debug)]
pub struct AtlasDatabase {
    session: Session,
    passwords: Box<dyn PasswordGenerator>,
}

impl AtlasDatabase {
    /// Controller talking to the public Atlas API
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }

    /// Controller whose clients come from `factory`
    pub fn with_factory(factory: impl ClientFactory + 'static) -> Self {
        Self::with_session(Session::with_factory(factory))
    }

    /// Controller over an existing session
    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            passwords: Box::new(PasswordPolicy::default()),
        }
    }

    /// Replace the password generator (builder pattern)
    pub fn with_password_generator(mut self, generator: impl PasswordGenerator + 'static) -> Self {
        self.passwords = Box::new(generator);
        self
    }

    /// The underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn resolve_password(&self, source: PasswordSource) -> CredentialResult<(SecretString, bool)> {
        match source {
            PasswordSource::Provided(password) => Ok((password, false)),
            PasswordSource::Generate => Ok((self.passwords.generate()?, true)),
        }
    }
}

impl Default for AtlasDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for AtlasDatabase {
    #[instrument(skip(self, request), fields(verify_connection = request.verify_connection))]
    async fn initialize(&self, request: InitializeRequest) -> CredentialResult<InitializeResponse> {
        let config = SessionConfig::from_document(&request.config)?;

        let mut session = self.session.lock().await;
        session.initialize(config);

        if request.verify_connection {
            session.client()?;
        }

        Ok(InitializeResponse {
            config: request.config,
        })
    }

    #[instrument(skip(self, request), fields(role = %request.username_config.role_name))]
    async fn new_user(&self, request: NewUserRequest) -> CredentialResult<NewUserResponse> {
        if request.statements.is_empty() {
            return Err(CredentialError::EmptyStatement);
        }

        let mut session = self.session.lock().await;
        let client = session.client()?;
        let config = session.config()?;
        let project_id = config.require_project_id()?;

        let username = config
            .username_template()
            .generate(&request.username_config)?;
        let statement = CreationStatement::from_statements(&request.statements)?;
        let (password, generated) = self.resolve_password(request.password)?;

        let user = DatabaseUser::new(
            &username,
            password.expose_secret(str::to_owned),
            &statement.database_name,
        )
        .with_roles(statement.roles)
        .with_scopes(statement.scopes);

        client
            .create_database_user(project_id, &user)
            .await
            .map_err(CredentialError::remote)?;

        info!(
            username = %username,
            project_id = %project_id,
            auth_database = %user.database_name,
            "Created Atlas database user"
        );

        Ok(NewUserResponse {
            username,
            password: generated.then_some(password),
        })
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn update_user(
        &self,
        request: UpdateUserRequest,
    ) -> CredentialResult<UpdateUserResponse> {
        let Some(change) = request.password else {
            // Expiration changes have no Atlas counterpart.
            debug!("No password change requested");
            return Ok(UpdateUserResponse);
        };

        let mut session = self.session.lock().await;
        let client = session.client()?;
        let project_id = session.config()?.require_project_id()?;

        let update = DatabaseUserUpdate::password(change.new_password.expose_secret(str::to_owned));
        client
            .update_database_user(project_id, DEFAULT_AUTH_DATABASE, &request.username, &update)
            .await
            .map_err(CredentialError::remote)?;

        info!(project_id = %project_id, "Changed Atlas database user password");
        Ok(UpdateUserResponse)
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn delete_user(
        &self,
        request: DeleteUserRequest,
    ) -> CredentialResult<DeleteUserResponse> {
        let mut session = self.session.lock().await;
        let client = session.client()?;
        let project_id = session.config()?.require_project_id()?;

        client
            .delete_database_user(project_id, DEFAULT_AUTH_DATABASE, &request.username)
            .await
            .map_err(CredentialError::remote)?;

        info!(project_id = %project_id, "Deleted Atlas database user");
        Ok(DeleteUserResponse)
    }

    async fn rotate_root_credentials(
        &self,
        _statements: Vec<String>,
    ) -> CredentialResult<ConfigDocument> {
        Err(CredentialError::NotImplemented {
            operation: "root credential rotation",
        })
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    async fn secret_values(&self) -> HashMap<String, String> {
        let session = self.session.lock().await;
        let mut secrets = HashMap::new();
        if let Ok(config) = session.config() {
            config.private_key().expose_secret(|key| {
                secrets.insert(key.to_owned(), PRIVATE_KEY_PLACEHOLDER.to_owned());
            });
        }
        secrets
    }

    async fn close(&self) -> CredentialResult<()> {
        self.session.lock().await.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UsernameMetadata;
    use crate::session::SharedClient;
    use atlas_admin::AtlasError;
    use atlas_admin::testing::{AtlasCall, FakeAtlas};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const STATEMENT: &str = r#"{"roles":[{"databaseName":"admin","roleName":"read"}]}"#;

    fn document(value: serde_json::Value) -> ConfigDocument {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn database(fake: &Arc<FakeAtlas>) -> AtlasDatabase {
        let fake = Arc::clone(fake);
        AtlasDatabase::with_factory(move |_: &SessionConfig| -> Result<SharedClient, AtlasError> {
            Ok(Arc::clone(&fake) as SharedClient)
        })
    }

    async fn initialized(fake: &Arc<FakeAtlas>) -> AtlasDatabase {
        let db = database(fake);
        db.initialize(InitializeRequest::new(document(json!({
            "public_key": "pub",
            "private_key": "priv",
            "project_id": "p1",
        }))))
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_provided_password_is_not_echoed() {
        let fake = Arc::new(FakeAtlas::new());
        let db = initialized(&fake).await;

        let response = db
            .new_user(NewUserRequest::new(
                UsernameMetadata::new("token", "test"),
                vec![STATEMENT.to_string()],
                "host-password",
            ))
            .await
            .unwrap();

        assert!(response.password.is_none());
        let stored = fake.user("p1", "admin", &response.username).unwrap();
        assert_eq!(stored.password.as_deref(), Some("host-password"));
    }

    #[tokio::test]
    async fn test_generated_password_is_returned() {
        let fake = Arc::new(FakeAtlas::new());
        let db = initialized(&fake).await;

        let response = db
            .new_user(NewUserRequest::generated(
                UsernameMetadata::new("token", "test"),
                vec![STATEMENT.to_string()],
            ))
            .await
            .unwrap();

        let password = response.password.unwrap();
        assert_eq!(password.len(), PasswordPolicy::DEFAULT_LENGTH);
        let stored = fake.user("p1", "admin", &response.username).unwrap();
        password.expose_secret(|p| assert_eq!(stored.password.as_deref(), Some(p)));
    }

    #[tokio::test]
    async fn test_missing_project_id_fails_before_remote_call() {
        let fake = Arc::new(FakeAtlas::new());
        let db = database(&fake);
        db.initialize(InitializeRequest::new(document(json!({
            "public_key": "pub",
            "private_key": "priv",
        }))))
        .await
        .unwrap();

        let err = db
            .delete_user(DeleteUserRequest::new("u1"))
            .await
            .unwrap_err();
        match err {
            CredentialError::Configuration(config) => assert_eq!(config.field(), "project_id"),
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_targets_admin_database() {
        let fake = Arc::new(FakeAtlas::new());
        fake.insert_user("p1", DatabaseUser::new("u1", "old", "admin"));
        let db = initialized(&fake).await;

        db.update_user(UpdateUserRequest::new("u1").with_password("new"))
            .await
            .unwrap();

        assert_eq!(
            fake.calls(),
            vec![AtlasCall::UpdateUser {
                project_id: "p1".to_string(),
                auth_database: "admin".to_string(),
                username: "u1".to_string(),
                update: DatabaseUserUpdate::password("new"),
            }]
        );
    }

    #[tokio::test]
    async fn test_secret_values() {
        let fake = Arc::new(FakeAtlas::new());
        let db = database(&fake);
        assert!(db.secret_values().await.is_empty());

        let db = initialized(&fake).await;
        let secrets = db.secret_values().await;
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets.get("priv").map(String::as_str), Some("[private_key]"));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(AtlasDatabase::new().type_name(), "mongodbatlas");
    }
}
