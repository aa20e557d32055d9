//! In-memory [`AtlasApi`] that records every call
//!
//! Keeps a user table per `(project, auth database, username)` with the same
//! conflict and not-found behavior as Atlas, records call order, and tracks how
//! many calls overlapped so tests can assert serialization.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::api::AtlasApi;
use crate::error::{AtlasError, AtlasResult};
use crate::model::{DatabaseUser, DatabaseUserUpdate};

/// A call received by [`FakeAtlas`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasCall {
    /// `create_database_user`
    CreateUser {
        /// Project the user was created in
        project_id: String,
        /// Body as sent
        user: DatabaseUser,
    },
    /// `update_database_user`
    UpdateUser {
        /// Project of the user
        project_id: String,
        /// Authentication database of the user
        auth_database: String,
        /// Target username
        username: String,
        /// Body as sent
        update: DatabaseUserUpdate,
    },
    /// `delete_database_user`
    DeleteUser {
        /// Project of the user
        project_id: String,
        /// Authentication database of the user
        auth_database: String,
        /// Target username
        username: String,
    },
    /// `get_database_user`
    GetUser {
        /// Project of the user
        project_id: String,
        /// Authentication database of the user
        auth_database: String,
        /// Target username
        username: String,
    },
}

impl AtlasCall {
    /// Username the call addressed
    pub fn username(&self) -> &str {
        match self {
            Self::CreateUser { user, .. } => &user.username,
            Self::UpdateUser { username, .. }
            | Self::DeleteUser { username, .. }
            | Self::GetUser { username, .. } => username,
        }
    }
}

/// Start or end of a call, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// Call entered the fake
    Started(String),
    /// Call returned
    Finished(String),
}

type UserKey = (String, String, String);

/// Recording fake of the Atlas admin API
#[derive(Debug, Default)]
pub struct FakeAtlas {
    users: Mutex<HashMap<UserKey, DatabaseUser>>,
    calls: Mutex<Vec<AtlasCall>>,
    events: Mutex<Vec<CallEvent>>,
    failures: Mutex<VecDeque<(u16, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Option<Duration>,
}

impl FakeAtlas {
    /// Empty fake with no latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call for `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call fail with an API error, without touching state
    pub fn fail_next(&self, status: u16, error_code: impl Into<String>) {
        self.failures.lock().push_back((status, error_code.into()));
    }

    /// Seed an existing user
    pub fn insert_user(&self, project_id: &str, user: DatabaseUser) {
        let key = (
            project_id.to_string(),
            user.database_name.clone(),
            user.username.clone(),
        );
        self.users.lock().insert(key, user);
    }

    /// Stored user, including the last password it was given
    pub fn user(&self, project_id: &str, auth_database: &str, username: &str) -> Option<DatabaseUser> {
        self.users
            .lock()
            .get(&key(project_id, auth_database, username))
            .cloned()
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<AtlasCall> {
        self.calls.lock().clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Start/finish log in arrival order
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().clone()
    }

    /// Largest number of calls that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn observe<T, F>(&self, call: AtlasCall, op: F) -> AtlasResult<T>
    where
        T: Send,
        F: FnOnce(&Self) -> AtlasResult<T> + Send,
    {
        let label = call.username().to_string();
        self.calls.lock().push(call);
        self.events.lock().push(CallEvent::Started(label.clone()));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self.failures.lock().pop_front();
        let result = match injected {
            Some((status, code)) => Err(AtlasError::Api {
                status,
                error_code: Some(code),
                detail: "injected failure".to_string(),
            }),
            None => op(self),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().push(CallEvent::Finished(label));
        result
    }
}

fn key(project_id: &str, auth_database: &str, username: &str) -> UserKey {
    (
        project_id.to_string(),
        auth_database.to_string(),
        username.to_string(),
    )
}

fn not_found(username: &str) -> AtlasError {
    AtlasError::Api {
        status: 404,
        error_code: Some("USERNAME_NOT_FOUND".to_string()),
        detail: format!("No user with username {username} exists."),
    }
}

#[async_trait]
impl AtlasApi for FakeAtlas {
    async fn create_database_user(
        &self,
        project_id: &str,
        user: &DatabaseUser,
    ) -> AtlasResult<DatabaseUser> {
        let call = AtlasCall::CreateUser {
            project_id: project_id.to_string(),
            user: user.clone(),
        };
        self.observe(call, |fake| {
            let mut users = fake.users.lock();
            let key = key(project_id, &user.database_name, &user.username);
            if users.contains_key(&key) {
                return Err(AtlasError::Api {
                    status: 409,
                    error_code: Some("USER_ALREADY_EXISTS".to_string()),
                    detail: format!("The user {} already exists.", user.username),
                });
            }
            let mut stored = user.clone();
            stored.group_id = Some(project_id.to_string());
            users.insert(key, stored.clone());

            stored.password = None;
            Ok(stored)
        })
        .await
    }

    async fn update_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
        update: &DatabaseUserUpdate,
    ) -> AtlasResult<DatabaseUser> {
        let call = AtlasCall::UpdateUser {
            project_id: project_id.to_string(),
            auth_database: auth_database.to_string(),
            username: username.to_string(),
            update: update.clone(),
        };
        self.observe(call, |fake| {
            let mut users = fake.users.lock();
            let stored = users
                .get_mut(&key(project_id, auth_database, username))
                .ok_or_else(|| not_found(username))?;
            if let Some(password) = &update.password {
                stored.password = Some(password.clone());
            }
            let mut echoed = stored.clone();
            echoed.password = None;
            Ok(echoed)
        })
        .await
    }

    async fn delete_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<()> {
        let call = AtlasCall::DeleteUser {
            project_id: project_id.to_string(),
            auth_database: auth_database.to_string(),
            username: username.to_string(),
        };
        self.observe(call, |fake| {
            fake.users
                .lock()
                .remove(&key(project_id, auth_database, username))
                .map(|_| ())
                .ok_or_else(|| not_found(username))
        })
        .await
    }

    async fn get_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<DatabaseUser> {
        let call = AtlasCall::GetUser {
            project_id: project_id.to_string(),
            auth_database: auth_database.to_string(),
            username: username.to_string(),
        };
        self.observe(call, |fake| {
            let mut user = fake
                .users
                .lock()
                .get(&key(project_id, auth_database, username))
                .cloned()
                .ok_or_else(|| not_found(username))?;
            user.password = None;
            Ok(user)
        })
        .await
    }
}
