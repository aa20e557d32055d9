//! MongoDB Atlas administration API client
//!
//! A small client for the part of the Atlas v1.0 admin API that manages
//! project database users. Requests are authenticated with an organization or
//! project API key pair over HTTP Digest.
//!
//! # Example
//!
//! ```no_run
//! use atlas_admin::{AtlasApi, AtlasClient, DatabaseUser, Role};
//!
//! # async fn example() -> Result<(), atlas_admin::AtlasError> {
//! let client = AtlasClient::builder("public-key", "private-key").build()?;
//!
//! let user = DatabaseUser::new("v-app-3kd9", "s3cret", "admin")
//!     .with_roles(vec![Role::new("admin", "readWriteAnyDatabase")]);
//!
//! client.create_database_user("5f1a...", &user).await?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

/// The `AtlasApi` seam implemented by the HTTP client and the test fake
pub mod api;
/// Digest-authenticated HTTP client
pub mod client;
mod digest;
/// Error types
pub mod error;
/// Wire models for database users
pub mod model;
/// Recording in-memory implementation of [`AtlasApi`]
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api::AtlasApi;
pub use client::{AtlasClient, AtlasClientBuilder, DEFAULT_BASE_URL};
pub use error::{AtlasError, AtlasResult};
pub use model::{ApiErrorBody, DatabaseUser, DatabaseUserUpdate, Role, Scope, ScopeType};
