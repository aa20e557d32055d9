//! Session configuration
//!
//! The host hands over a loosely-typed document. [`SessionConfig::from_document`]
//! decodes it against a fixed schema:
//!
//! | key                 | required               | notes                                 |
//! |---------------------|------------------------|---------------------------------------|
//! | `public_key`        | yes                    | digest username                       |
//! | `private_key`       | yes                    | digest password, kept as a secret     |
//! | `project_id`        | for user operations    | Atlas project (group) id              |
//! | `username_template` | no                     | replaces [`DEFAULT_USERNAME_TEMPLATE`] |
//!
//! Values must be scalars; numbers and booleans are converted to strings and
//! `null` counts as absent. Keys outside the schema are ignored.

use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::core::{ConfigDocument, ConfigError};
use crate::username::{DEFAULT_USERNAME_TEMPLATE, UsernameTemplate};
use crate::utils::SecretString;

/// `public_key` configuration key
pub const PUBLIC_KEY: &str = "public_key";
/// `private_key` configuration key
pub const PRIVATE_KEY: &str = "private_key";
/// `project_id` configuration key
pub const PROJECT_ID: &str = "project_id";
/// `username_template` configuration key
pub const USERNAME_TEMPLATE: &str = "username_template";

/// Validated connection settings of a session
#[derive(Clone)]
pub struct SessionConfig {
    public_key: String,
    private_key: SecretString,
    project_id: Option<String>,
    username_template: UsernameTemplate,
}

impl SessionConfig {
    /// Settings for an API key pair, with the built-in username template
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<SecretString>,
    ) -> Result<Self, ConfigError> {
        let public_key = public_key.into();
        let private_key = private_key.into();

        if public_key.is_empty() {
            return Err(missing(PUBLIC_KEY));
        }
        if private_key.is_empty() {
            return Err(missing(PRIVATE_KEY));
        }

        Ok(Self {
            public_key,
            private_key,
            project_id: None,
            username_template: parse_template(DEFAULT_USERNAME_TEMPLATE)?,
        })
    }

    /// Set the project id (builder pattern); empty means unset
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        self.project_id = (!project_id.is_empty()).then_some(project_id);
        self
    }

    /// Replace the username template (builder pattern)
    pub fn with_username_template(mut self, template: &str) -> Result<Self, ConfigError> {
        self.username_template = parse_template(template)?;
        Ok(self)
    }

    /// Decode and validate a configuration document
    pub fn from_document(document: &ConfigDocument) -> Result<Self, ConfigError> {
        let mut public_key = None;
        let mut private_key = None;
        let mut project_id = None;
        let mut username_template = None;

        for (key, value) in document {
            let slot = match key.as_str() {
                PUBLIC_KEY => &mut public_key,
                PRIVATE_KEY => &mut private_key,
                PROJECT_ID => &mut project_id,
                USERNAME_TEMPLATE => &mut username_template,
                other => {
                    debug!(key = %other, "Ignoring unrecognised configuration key");
                    continue;
                }
            };
            *slot = scalar(key, value)?;
        }

        let mut config = Self::new(
            public_key.unwrap_or_default(),
            SecretString::new(private_key.unwrap_or_default()),
        )?;
        if let Some(project_id) = project_id {
            config = config.with_project_id(project_id);
        }
        if let Some(template) = username_template.filter(|t| !t.is_empty()) {
            config = config.with_username_template(&template)?;
        }
        Ok(config)
    }

    /// Atlas API public key
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Atlas API private key
    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    /// Atlas project id, if configured
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Atlas project id, or a configuration error naming `project_id`
    pub fn require_project_id(&self) -> Result<&str, ConfigError> {
        self.project_id().ok_or_else(|| missing(PROJECT_ID))
    }

    /// Username template in effect
    pub fn username_template(&self) -> &UsernameTemplate {
        &self.username_template
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .field("project_id", &self.project_id)
            .field("username_template", &self.username_template.source())
            .finish()
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
    }
}

fn parse_template(source: &str) -> Result<UsernameTemplate, ConfigError> {
    UsernameTemplate::parse(source).map_err(|e| ConfigError::InvalidValue {
        field: USERNAME_TEMPLATE.to_string(),
        reason: e.to_string(),
    })
}

/// Weakly convert a scalar to a string; `null` is absent
/// Weak scalar-to-string conversion applied to every recognised key
pub(crate) fn scalar(field: &str, value: &Value) -> Result<Option<String>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "expected a string".to_string(),
        }),
    }
}
