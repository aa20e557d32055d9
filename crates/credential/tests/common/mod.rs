//! Shared helpers for the integration tests
#![allow(dead_code)]

use atlas_admin::AtlasError;
use atlas_admin::testing::FakeAtlas;
use atlas_credential::prelude::*;
use atlas_credential::{ConfigDocument, SharedClient};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creation statement granting `read` on `admin`, no database name
pub const READ_STATEMENT: &str = r#"{"roles":[{"databaseName":"admin","roleName":"read"}]}"#;

/// Route test logs through the test writer; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Unwrap a JSON object literal
pub fn document(value: Value) -> ConfigDocument {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// Complete configuration for project `p1`
pub fn config() -> ConfigDocument {
    document(json!({
        "public_key": "pub-key",
        "private_key": "priv-key",
        "project_id": "p1",
    }))
}

/// Controller whose every client is `fake`; `built` counts client constructions
pub fn database_counting(fake: &Arc<FakeAtlas>, built: &Arc<AtomicUsize>) -> AtlasDatabase {
    let fake = Arc::clone(fake);
    let built = Arc::clone(built);
    AtlasDatabase::with_factory(move |_: &SessionConfig| -> Result<SharedClient, AtlasError> {
        built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&fake) as SharedClient)
    })
}

/// Controller whose every client is `fake`
pub fn database(fake: &Arc<FakeAtlas>) -> AtlasDatabase {
    database_counting(fake, &Arc::new(AtomicUsize::new(0)))
}

/// Controller over `fake`, initialized with [`config`]
pub async fn initialized(fake: &Arc<FakeAtlas>) -> AtlasDatabase {
    init_tracing();
    let db = database(fake);
    db.initialize(InitializeRequest::new(config()))
        .await
        .expect("initialize with a complete config");
    db
}

/// Issue request for `role` with the given statements and a provided password
pub fn issue(role: &str, statements: &[&str]) -> NewUserRequest {
    NewUserRequest::new(
        UsernameMetadata::new("token", role),
        statements.iter().map(ToString::to_string).collect(),
        "Pa55-word-from-host",
    )
}

/// Whether `username` matches `^v-<role>-[a-zA-Z0-9]{n}$`
pub fn is_default_username(username: &str, role: &str, n: usize) -> bool {
    let prefix = format!("v-{role}-");
    username.len() == prefix.len() + n
        && username.starts_with(&prefix)
        && username[prefix.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
}
