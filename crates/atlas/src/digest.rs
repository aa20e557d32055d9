//! HTTP Digest answers for the Atlas API key pair
//!
//! The public key is the digest username and the private key the password.

use digest_auth::{AuthContext, HttpMethod};
use reqwest::Method;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{AtlasError, AtlasResult};

/// API key pair used to answer digest challenges
#[derive(Clone)]
pub(crate) struct DigestCredentials {
    public_key: String,
    private_key: Zeroizing<String>,
}

impl DigestCredentials {
    pub(crate) fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: Zeroizing::new(private_key.into()),
        }
    }

    /// Compute the `Authorization` header value for a `WWW-Authenticate` challenge.
    ///
    /// `uri` is the request target (path and query) exactly as sent.
    pub(crate) fn authorize(
        &self,
        challenge: &str,
        method: &Method,
        uri: &str,
        body: Option<&[u8]>,
    ) -> AtlasResult<String> {
        let mut prompt = digest_auth::parse(challenge).map_err(|e| AtlasError::Digest {
            reason: format!("unparseable challenge: {e}"),
        })?;

        let method = HttpMethod::from(method.as_str());

        let context = AuthContext::new_with_method(
            self.public_key.as_str(),
            self.private_key.as_str(),
            uri,
            body,
            method,
        );

        let answer = prompt.respond(&context).map_err(|e| AtlasError::Digest {
            reason: format!("cannot answer challenge: {e}"),
        })?;

        Ok(answer.to_header_string())
    }
}

impl fmt::Debug for DigestCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestCredentials")
            .field("public_key", &self.public_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHALLENGE: &str = r#"Digest realm="MMS Public API", domain="", nonce="OSYvsOHOn1Frj26K1ZbmqBtBoVjQ5PjH", algorithm=MD5, qop="auth", stale=false"#;

    #[test]
    fn test_authorize_answers_md5_challenge() {
        let creds = DigestCredentials::new("pubkey", "privkey");
        let header = creds
            .authorize(
                CHALLENGE,
                &Method::DELETE,
                "/api/atlas/v1.0/groups/p1/databaseUsers/admin/u1",
                None,
            )
            .unwrap();

        assert!(header.starts_with("Digest "));
        assert!(header.contains(r#"username="pubkey""#));
        assert!(header.contains(r#"uri="/api/atlas/v1.0/groups/p1/databaseUsers/admin/u1""#));
        assert!(!header.contains("privkey"));
    }

    #[test]
    fn test_authorize_rejects_non_digest_challenge() {
        let creds = DigestCredentials::new("pubkey", "privkey");
        let err = creds
            .authorize(r#"Bearer realm="x""#, &Method::GET, "/", None)
            .unwrap_err();
        assert!(matches!(err, AtlasError::Digest { .. }));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let creds = DigestCredentials::new("pubkey", "privkey");
        assert!(!format!("{creds:?}").contains("privkey"));
    }
}
