//! Core types: configuration, requests, creation statements and errors

pub mod config;
mod error;
mod request;
pub mod statement;

pub use config::SessionConfig;
pub use error::{ConfigError, CredentialError, CredentialResult};
pub use request::{
    ChangeExpiration, ChangePassword, ConfigDocument, DeleteUserRequest, DeleteUserResponse,
    InitializeRequest, InitializeResponse, NewUserRequest, NewUserResponse, PasswordSource,
    UpdateUserRequest, UpdateUserResponse, UsernameMetadata,
};
pub use statement::{CreationStatement, DEFAULT_AUTH_DATABASE};
