//! Repositories for access records
//!
//! The resolver only needs [`AccessSource`]. The permissions editor and the
//! HTTP surface also need [`AccessWriter`]; [`AccessStore`] bundles both with
//! a health check so a single trait object can back the service.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AccessResult;
use crate::models::{PermissionFlags, RoleSet, UserAccess};

pub mod access;
pub mod memory;

pub use access::PgAccessRepository;
pub use memory::InMemoryAccessStore;

/// Read side of the access records, keyed by user id
#[async_trait]
pub trait AccessSource: Send + Sync {
    /// Stored role set. `Err(AccessError::NotFound)` when the user has no record.
    async fn fetch_roles(&self, user_id: Uuid) -> AccessResult<RoleSet>;

    /// Stored permission flags. `Err(AccessError::NotFound)` when the user has no record.
    async fn fetch_permission_flags(&self, user_id: Uuid) -> AccessResult<PermissionFlags>;
}

/// Administrative write side
#[async_trait]
pub trait AccessWriter: Send + Sync {
    /// Replace both records for a user in one step.
    /// `Err(AccessError::NotFound)` when the user does not exist.
    async fn update_roles_and_permissions(
        &self,
        user_id: Uuid,
        roles: &RoleSet,
        permissions: &PermissionFlags,
    ) -> AccessResult<()>;

    /// Every known user with their roles and flags (defaults where records are missing)
    async fn list_users_with_access(&self) -> AccessResult<Vec<UserAccess>>;
}

/// Complete backend for the access service
#[async_trait]
pub trait AccessStore: AccessSource + AccessWriter {
    async fn health_check(&self) -> AccessResult<bool>;
}
