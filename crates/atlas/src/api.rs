use async_trait::async_trait;

use crate::error::AtlasResult;
use crate::model::{DatabaseUser, DatabaseUserUpdate};

/// Database-user operations of the Atlas admin API
///
/// Every call maps to exactly one HTTP exchange. Implementations never retry:
/// a create whose response was lost may still have taken effect remotely.
#[async_trait]
pub trait AtlasApi: Send + Sync {
    /// `POST groups/{project_id}/databaseUsers`
    async fn create_database_user(
        &self,
        project_id: &str,
        user: &DatabaseUser,
    ) -> AtlasResult<DatabaseUser>;

    /// `PATCH groups/{project_id}/databaseUsers/{auth_database}/{username}`
    async fn update_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
        update: &DatabaseUserUpdate,
    ) -> AtlasResult<DatabaseUser>;

    /// `DELETE groups/{project_id}/databaseUsers/{auth_database}/{username}`
    async fn delete_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<()>;

    /// `GET groups/{project_id}/databaseUsers/{auth_database}/{username}`
    ///
    /// Read-only lookup of an existing user's roles and scopes; the password is
    /// never returned. The credential lifecycle does not call it, since its
    /// mutations are single attempts with no read-before-write. It is kept for
    /// callers that need to inspect a user, such as reconciliation tooling.
    async fn get_database_user(
        &self,
        project_id: &str,
        auth_database: &str,
        username: &str,
    ) -> AtlasResult<DatabaseUser>;
}
