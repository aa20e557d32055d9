//! Atlas Credential - dynamic MongoDB Atlas database users
//!
//! Issues, rotates and revokes short-lived database users through the Atlas
//! admin API on behalf of a secrets host, which decides when leases start and
//! end.
//!
//! # Components
//!
//! - [`session`] - one lazily built, cached Atlas client per connection behind
//!   a single async lock
//! - [`AtlasDatabase`] - the lifecycle operations (initialize, new user,
//!   update, delete) implementing [`Database`]
//! - [`UsernameTemplate`] and [`PasswordPolicy`] - generated usernames and passwords
//! - [`ErrorSanitizer`] - scrubs configured secrets from error text
#![forbid(unsafe_code)]

/// Configuration, requests, creation statements and errors
pub mod core;
/// Credential lifecycle controller
pub mod lifecycle;
/// Password generation
pub mod password;
/// Error sanitizing middleware
pub mod sanitize;
/// Session manager
pub mod session;
/// Database plugin traits
pub mod traits;
/// Username templates
pub mod username;
/// Secret handling
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::core::{
    ChangeExpiration, ChangePassword, ConfigDocument, ConfigError, CreationStatement,
    CredentialError, CredentialResult, DeleteUserRequest, DeleteUserResponse, InitializeRequest,
    InitializeResponse, NewUserRequest, NewUserResponse, PasswordSource, SessionConfig,
    UpdateUserRequest, UpdateUserResponse, UsernameMetadata,
};
pub use crate::lifecycle::AtlasDatabase;
pub use crate::password::{PasswordGenerator, PasswordPolicy};
pub use crate::sanitize::ErrorSanitizer;
pub use crate::session::{ClientFactory, HttpClientFactory, Session, SessionGuard, SharedClient};
pub use crate::traits::Database;
pub use crate::username::{DEFAULT_USERNAME_TEMPLATE, TemplateError, UsernameTemplate};
pub use crate::utils::SecretString;

/// Commonly used types and traits
pub mod prelude {
    pub use crate::core::{
        CredentialError, CredentialResult, DeleteUserRequest, InitializeRequest, NewUserRequest,
        PasswordSource, SessionConfig, UpdateUserRequest, UsernameMetadata,
    };
    pub use crate::lifecycle::AtlasDatabase;
    pub use crate::sanitize::ErrorSanitizer;
    pub use crate::traits::Database;
    pub use crate::utils::SecretString;
}
