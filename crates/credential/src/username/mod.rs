//! Username generation for issued database users
//!
//! A [`UsernameTemplate`] renders the request's [`UsernameMetadata`] and then
//! normalizes the result to what Atlas accepts as a SCRAM username.

mod template;

pub use template::{Template, TemplateError};

use crate::core::{CredentialError, CredentialResult, UsernameMetadata};

/// Template used when the configuration does not set `username_template`
///
/// Renders `v-<role, max 15>-<random>` cut to 20 characters.
pub const DEFAULT_USERNAME_TEMPLATE: &str =
    r#"{{ printf "v-%s-%s" (.RoleName | truncate 15) (random 20) | truncate 20 }}"#;

/// Longest username kept after rendering
pub const MAX_USERNAME_LEN: usize = 1024;

/// Parsed username template plus output normalization
#[derive(Debug, Clone, PartialEq)]
pub struct UsernameTemplate {
    template: Template,
}

impl UsernameTemplate {
    /// Parse a username template
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            template: Template::parse(source)?,
        })
    }

    /// The built-in template
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::parse(DEFAULT_USERNAME_TEMPLATE)
    }

    /// Template text
    pub fn source(&self) -> &str {
        self.template.source()
    }

    /// Render a username for one request
    ///
    /// Characters outside `[A-Za-z0-9._-]` are dropped and the result is cut to
    /// [`MAX_USERNAME_LEN`]. An empty result is an error.
    pub fn generate(&self, metadata: &UsernameMetadata) -> CredentialResult<String> {
        let rendered =
            self.template
                .render(metadata)
                .map_err(|e| CredentialError::InvalidUsername {
                    reason: e.to_string(),
                })?;

        let username: String = rendered
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .take(MAX_USERNAME_LEN)
            .collect();

        if username.is_empty() {
            return Err(CredentialError::InvalidUsername {
                reason: format!("template {:?} rendered an empty username", self.source()),
            });
        }
        Ok(username)
    }
}
