//! Digest-authenticated HTTP client for the Atlas admin API.
//!
//! Each operation sends its request once without credentials. Atlas rejects
//! it with `401` and a `WWW-Authenticate: Digest …` challenge before acting on
//! it; the client then answers the challenge on a second request that carries
//! the `Authorization` header. No other resend happens: transport failures and
//! API errors are returned as-is.
//!
//! # Example
//!
//! ```no_run
//! use atlas_admin::{AtlasApi, AtlasClient};
//!
//! # async fn example() -> Result<(), atlas_admin::AtlasError> {
//! let client = AtlasClient::builder("public-key", "private-key")
//!     .user_agent("my-broker/1.0")
//!     .build()?;
//!
//! client.delete_database_user("5f1a...", "admin", "v-app-3kd9").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::api::AtlasApi;
use crate::digest::DigestCredentials;
use crate::error::{AtlasError, AtlasResult};
use crate::model::{ApiErrorBody, DatabaseUser, DatabaseUserUpdate};

/// Public Atlas admin API, version 1.0
pub const DEFAULT_BASE_URL: &str = "https://cloud.mongodb.com/api/atlas/v1.0/";

/// User agent sent when the caller does not set one
pub const DEFAULT_USER_AGENT: &str = concat!("atlas-admin/", env!("CARGO_PKG_VERSION"));

/// Builder for [`AtlasClient`]
#[derive(Debug, Clone)]
pub struct AtlasClientBuilder {
    credentials: DigestCredentials,
    base_url: String,
    user_agent: String,
    timeout: Option<Duration>,
}

impl AtlasClientBuilder {
    /// Override the API root, e.g. for Atlas for Government or a test server
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the `User-Agent` header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a whole-request timeout. Unset by default, so the caller's deadline applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client. Performs no network I/O.
    pub fn build(self) -> AtlasResult<AtlasClient> {
        let mut base_url = Url::parse(&self.base_url).map_err(|e| AtlasError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(AtlasError::InvalidBaseUrl {
                url: self.base_url,
                reason: "must be an http(s) URL".to_string(),
            });
        }
        // `path_segments_mut` appends after the last segment, so drop a trailing slash here
        // and keep `…/v1.0` + `groups/…` joined correctly.
        if base_url.path().ends_with('/') {
            let trimmed = base_url.path().trim_end_matches('/').to_string();
            base_url.set_path(&trimmed);
        }

        let mut http = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build().map_err(AtlasError::Build)?;

        Ok(AtlasClient {
            http,
            base_url,
            credentials: self.credentials,
        })
    }
}

/// Atlas admin API client authenticated with an API key pair
#[derive(Debug, Clone)]
pub struct AtlasClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: DigestCredentials,
}

impl AtlasClient {
    /// Start building a client for the given API key pair
    pub fn builder(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> AtlasClientBuilder {
        AtlasClientBuilder {
            credentials: DigestCredentials::new(public_key, private_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> AtlasResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AtlasError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot append path segments".to_string(),
            })?
            .extend(segments);
        Ok(url)
    }

    fn user_endpoint(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<Url> {
        self.endpoint(&[
            "groups",
            project_id,
            "databaseUsers",
            auth_database,
            username,
        ])
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&[u8]>,
        authorization: Option<String>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        request
    }

    async fn execute(&self, method: Method, url: Url, body: Option<&[u8]>) -> AtlasResult<Response> {
        let response = self
            .request(method.clone(), url.clone(), body, None)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.trim_start().starts_with("Digest"))
            .map(str::to_owned);

        // A 401 without a digest challenge is a real rejection, decode it as such.
        let Some(challenge) = challenge else {
            return Ok(response);
        };

        let target = &url[url::Position::BeforePath..];
        let authorization = self
            .credentials
            .authorize(&challenge, &method, target, body)?;

        debug!(method = %method, target = %target, "Answering Atlas digest challenge");

        Ok(self
            .request(method, url, body, Some(authorization))
            .send()
            .await?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> AtlasResult<T> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn expect_success(response: Response) -> AtlasResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await?;
        Err(api_error(status, &body))
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> AtlasError {
    let parsed: ApiErrorBody = serde_json::from_slice(body).unwrap_or_default();

    let detail = parsed
        .detail
        .or(parsed.reason)
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    AtlasError::Api {
        status: status.as_u16(),
        error_code: parsed.error_code,
        detail,
    }
}

#[async_trait]
impl AtlasApi for AtlasClient {
    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    async fn create_database_user(
        &self,
        project_id: &str,
        user: &DatabaseUser,
    ) -> AtlasResult<DatabaseUser> {
        let url = self.endpoint(&["groups", project_id, "databaseUsers"])?;
        let body = serde_json::to_vec(user)?;
        let response = self.execute(Method::POST, url, Some(&body)).await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
        update: &DatabaseUserUpdate,
    ) -> AtlasResult<DatabaseUser> {
        let url = self.user_endpoint(project_id, auth_database, username)?;
        let body = serde_json::to_vec(update)?;
        let response = self.execute(Method::PATCH, url, Some(&body)).await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<()> {
        let url = self.user_endpoint(project_id, auth_database, username)?;
        let response = self.execute(Method::DELETE, url, None).await?;
        Self::expect_success(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<DatabaseUser> {
        let url = self.user_endpoint(project_id, auth_database, username)?;
        let response = self.execute(Method::GET, url, None).await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let client = AtlasClient::builder("pub", "priv").build().unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://cloud.mongodb.com/api/atlas/v1.0"
        );
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = AtlasClient::builder("pub", "priv")
            .base_url("mailto:ops@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, AtlasError::InvalidBaseUrl { .. }));

        let err = AtlasClient::builder("pub", "priv")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, AtlasError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_user_endpoint_encodes_segments() {
        let client = AtlasClient::builder("pub", "priv").build().unwrap();
        let url = client
            .user_endpoint("5f1a", "admin", "v-test/odd name")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.mongodb.com/api/atlas/v1.0/groups/5f1a/databaseUsers/admin/v-test%2Fodd%20name"
        );
    }

    #[test]
    fn test_api_error_prefers_detail_then_reason_then_body() {
        let err = api_error(
            StatusCode::CONFLICT,
            br#"{"error":409,"errorCode":"DUPLICATE_DATABASE_USER","detail":"already exists","reason":"Conflict"}"#,
        );
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.error_code(), Some("DUPLICATE_DATABASE_USER"));
        assert!(err.to_string().ends_with("already exists"));

        let err = api_error(StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(err.to_string().ends_with("upstream down"));

        let err = api_error(StatusCode::SERVICE_UNAVAILABLE, b"");
        assert!(err.to_string().ends_with("Service Unavailable"));
    }
}
