//! Error sanitizing wrapper for any [`Database`]
//!
//! Remote errors can quote request details back. [`ErrorSanitizer`] checks the
//! text of every failed operation for the wrapped database's
//! [`secret_values`](Database::secret_values) and, when one occurs, returns
//! [`CredentialError::Redacted`] with each secret replaced by its placeholder.
//! Errors that contain no secret are returned unchanged.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

use crate::core::{
    ConfigDocument, CredentialError, CredentialResult, DeleteUserRequest, DeleteUserResponse,
    InitializeRequest, InitializeResponse, NewUserRequest, NewUserResponse, UpdateUserRequest,
    UpdateUserResponse, config,
};
use crate::lifecycle::PRIVATE_KEY_PLACEHOLDER;
use crate::traits::Database;

/// [`Database`] wrapper that scrubs secrets from error text
#[derive(Debug)]
pub struct ErrorSanitizer<D> {
    inner: D,
}

impl<D: Database> ErrorSanitizer<D> {
    /// Wrap `inner`
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped database
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwrap
    pub fn into_inner(self) -> D {
        self.inner
    }

    async fn sanitize(&self, err: CredentialError) -> CredentialError {
        let secrets = self.inner.secret_values().await;
        redact(err, &secrets)
    }
}

fn redact(err: CredentialError, secrets: &HashMap<String, String>) -> CredentialError {
    let text = err.to_string();
    let mut leaked: Vec<_> = secrets
        .iter()
        .filter(|(secret, _)| !secret.is_empty() && text.contains(secret.as_str()))
        .collect();
    if leaked.is_empty() {
        return err;
    }

    // Longest first so a secret that contains another is replaced whole.
    leaked.sort_by_key(|(secret, _)| std::cmp::Reverse(secret.len()));

    let message = leaked
        .into_iter()
        .fold(text, |message, (secret, placeholder)| {
            message.replace(secret.as_str(), placeholder)
        });
    warn!("Redacted secret values from error");
    CredentialError::Redacted { message }
}

#[async_trait]
impl<D: Database> Database for ErrorSanitizer<D> {
    async fn initialize(&self, request: InitializeRequest) -> CredentialResult<InitializeResponse> {
        // The key being configured is not in `secret_values` yet if initialize fails.
        let pending = request
            .config
            .get(config::PRIVATE_KEY)
            .and_then(|value| config::scalar(config::PRIVATE_KEY, value).ok().flatten());

        match self.inner.initialize(request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                let mut secrets = self.inner.secret_values().await;
                if let Some(key) = pending {
                    secrets.insert(key, PRIVATE_KEY_PLACEHOLDER.to_string());
                }
                Err(redact(err, &secrets))
            }
        }
    }

    async fn new_user(&self, request: NewUserRequest) -> CredentialResult<NewUserResponse> {
        match self.inner.new_user(request).await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.sanitize(err).await),
        }
    }

    async fn update_user(
        &self,
        request: UpdateUserRequest,
    ) -> CredentialResult<UpdateUserResponse> {
        match self.inner.update_user(request).await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.sanitize(err).await),
        }
    }

    async fn delete_user(
        &self,
        request: DeleteUserRequest,
    ) -> CredentialResult<DeleteUserResponse> {
        match self.inner.delete_user(request).await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.sanitize(err).await),
        }
    }

    async fn rotate_root_credentials(
        &self,
        statements: Vec<String>,
    ) -> CredentialResult<ConfigDocument> {
        match self.inner.rotate_root_credentials(statements).await {
            Ok(config) => Ok(config),
            Err(err) => Err(self.sanitize(err).await),
        }
    }

    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    async fn secret_values(&self) -> HashMap<String, String> {
        self.inner.secret_values().await
    }

    async fn close(&self) -> CredentialResult<()> {
        match self.inner.close().await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.sanitize(err).await),
        }
    }
}
