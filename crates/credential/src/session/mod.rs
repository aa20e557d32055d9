//! Session manager: one lazily built Atlas client per configured connection
//!
//! The session owns the configuration and the cached client behind a single
//! async mutex. Callers take the lock with [`Session::lock`] and keep the
//! [`SessionGuard`] for the whole operation, so client construction and the
//! remote call that follows never interleave with another operation.
//!
//! The client is either absent or valid. A failed construction leaves it
//! absent and the next [`SessionGuard::client`] call starts over.

use atlas_admin::{AtlasApi, AtlasClient, AtlasError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::core::{CredentialError, CredentialResult, SessionConfig};

/// Shared handle to an Atlas API implementation
pub type SharedClient = Arc<dyn AtlasApi>;

/// User agent of clients built by [`HttpClientFactory`]
pub const USER_AGENT: &str = concat!("atlas-credential/", env!("CARGO_PKG_VERSION"));

/// Builds the Atlas client for a configuration
///
/// Implemented for closures, which is how tests inject fakes:
///
/// ```
/// use atlas_credential::session::{Session, SharedClient};
/// use atlas_credential::SessionConfig;
/// use atlas_admin::{AtlasClient, AtlasError};
/// use std::sync::Arc;
///
/// let session = Session::with_factory(|config: &SessionConfig| -> Result<SharedClient, AtlasError> {
///     let client = AtlasClient::builder(config.public_key(), "test").build()?;
///     Ok(Arc::new(client) as SharedClient)
/// });
/// ```
pub trait ClientFactory: Send + Sync {
    /// Construct a client; performs no remote call
    fn build(&self, config: &SessionConfig) -> Result<SharedClient, AtlasError>;
}

impl<F> ClientFactory for F
where
    F: Fn(&SessionConfig) -> Result<SharedClient, AtlasError> + Send + Sync,
{
    fn build(&self, config: &SessionConfig) -> Result<SharedClient, AtlasError> {
        self(config)
    }
}

/// Builds digest-authenticated [`AtlasClient`]s
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    base_url: Option<String>,
    user_agent: String,
}

impl HttpClientFactory {
    /// Factory for the public Atlas API
    pub fn new() -> Self {
        Self {
            base_url: None,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Talk to another API root (builder pattern)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the user agent (builder pattern)
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, config: &SessionConfig) -> Result<SharedClient, AtlasError> {
        let private_key = config.private_key().expose_secret(str::to_owned);
        let mut builder = AtlasClient::builder(config.public_key(), private_key)
            .user_agent(self.user_agent.clone());
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url.clone());
        }
        Ok(Arc::new(builder.build()?))
    }
}

#[derive(Default)]
struct SessionState {
    config: Option<SessionConfig>,
    client: Option<SharedClient>,
}

/// Configuration plus cached client, behind one lock
pub struct Session {
    state: Mutex<SessionState>,
    factory: Box<dyn ClientFactory>,
}

impl Session {
    /// Session that builds [`AtlasClient`]s for the public API
    pub fn new() -> Self {
        Self::with_factory(HttpClientFactory::new())
    }

    /// Session with a custom client factory
    pub fn with_factory(factory: impl ClientFactory + 'static) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            factory: Box::new(factory),
        }
    }

    /// Wait for exclusive access
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            state: self.state.lock().await,
            factory: self.factory.as_ref(),
        }
    }

    /// Store a configuration; see [`SessionGuard::initialize`]
    pub async fn initialize(&self, config: SessionConfig) {
        self.lock().await.initialize(config);
    }

    /// Cached or newly built client; see [`SessionGuard::client`]
    pub async fn client(&self) -> CredentialResult<SharedClient> {
        self.lock().await.client()
    }

    /// Drop the cached client; see [`SessionGuard::close`]
    pub async fn close(&self) {
        self.lock().await.close();
    }

    /// Whether a configuration has been stored
    pub async fn is_initialized(&self) -> bool {
        self.lock().await.is_initialized()
    }

    /// Whether a client is currently cached
    pub async fn has_client(&self) -> bool {
        self.lock().await.has_client()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Exclusive access to a [`Session`] for the duration of one operation
pub struct SessionGuard<'a> {
    state: MutexGuard<'a, SessionState>,
    factory: &'a dyn ClientFactory,
}

impl SessionGuard<'_> {
    /// Replace the configuration
    ///
    /// An already built client is kept; it goes away only on [`close`](Self::close).
    pub fn initialize(&mut self, config: SessionConfig) {
        info!(
            project_id = ?config.project_id(),
            cached_client = self.state.client.is_some(),
            "Session configured"
        );
        self.state.config = Some(config);
    }

    /// Stored configuration
    pub fn config(&self) -> CredentialResult<&SessionConfig> {
        self.state
            .config
            .as_ref()
            .ok_or(CredentialError::NotInitialized)
    }

    /// The cached client, building and caching it first if needed
    pub fn client(&mut self) -> CredentialResult<SharedClient> {
        if let Some(client) = &self.state.client {
            return Ok(Arc::clone(client));
        }

        let config = self
            .state
            .config
            .as_ref()
            .ok_or(CredentialError::NotInitialized)?;

        let client = self.factory.build(config).map_err(|source| {
            error!(error = %source, "Failed to create Atlas client");
            CredentialError::Transport { source }
        })?;

        debug!("Created Atlas client");
        self.state.client = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the cached client; the configuration stays
    pub fn close(&mut self) {
        if self.state.client.take().is_some() {
            debug!("Closed Atlas client");
        }
    }

    /// Whether a configuration has been stored
    pub fn is_initialized(&self) -> bool {
        self.state.config.is_some()
    }

    /// Whether a client is currently cached
    pub fn has_client(&self) -> bool {
        self.state.client.is_some()
    }
}
