//! Permissions management: edit and persist other users' access
//!
//! Every operation re-checks that the acting user is a settled admin, whatever
//! the calling view already decided.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::error::{AccessError, AccessResult};
use crate::models::{AccessUpdate, Permission, PermissionFlags, Role, RoleSet, UserAccess};
use crate::repositories::AccessWriter;

/// Unsaved edits to one user's roles and permission flags
#[derive(Debug, Clone, PartialEq)]
pub struct AccessDraft {
    pub user_id: Uuid,
    pub roles: RoleSet,
    pub permissions: PermissionFlags,
}

impl AccessDraft {
    pub fn new(user_id: Uuid, update: AccessUpdate) -> Self {
        Self {
            user_id,
            roles: update.roles,
            permissions: update.permissions,
        }
    }

    /// Removing the last role leaves `[viewer]`
    pub fn toggle_role(&mut self, role: Role) {
        self.roles.toggle(role);
    }

    pub fn toggle_permission(&mut self, permission: Permission) {
        self.permissions.toggle(permission);
    }
}

impl From<&UserAccess> for AccessDraft {
    fn from(user: &UserAccess) -> Self {
        Self {
            user_id: user.id,
            roles: user.roles.clone(),
            permissions: user.permissions,
        }
    }
}

/// Admin-only operations over the access records
pub struct AdminService<W: ?Sized> {
    writer: Arc<W>,
}

impl<W: ?Sized> Clone for AdminService<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: AccessWriter + ?Sized> AdminService<W> {
    /// Create a new admin service
    pub fn new(writer: Arc<W>) -> Self {
        Self { writer }
    }

    /// Every user with their current roles and flags
    pub async fn list_users(&self, caps: &Capabilities) -> AccessResult<Vec<UserAccess>> {
        ensure_admin(caps)?;
        self.writer.list_users_with_access().await
    }

    /// Persist a draft. Roles and flags are written together.
    pub async fn save(&self, caps: &Capabilities, draft: &AccessDraft) -> AccessResult<()> {
        ensure_admin(caps)?;

        self.writer
            .update_roles_and_permissions(draft.user_id, &draft.roles, &draft.permissions)
            .await?;

        let granted: Vec<&str> = draft.permissions.granted().map(|p| p.label()).collect();
        info!(
            "Saved access for user {}: roles {:?}, permissions {:?}",
            draft.user_id,
            draft.roles.to_tags(),
            granted
        );

        Ok(())
    }
}

/// Reject anyone but an admin whose capabilities have settled
pub fn ensure_admin(caps: &Capabilities) -> AccessResult<()> {
    if caps.loading {
        warn!("Rejected admin operation while capabilities are loading");
        return Err(AccessError::Forbidden(
            "Capabilities are still loading".to_string(),
        ));
    }

    if !caps.is_admin {
        warn!("Rejected admin operation for non-admin user");
        return Err(AccessError::Forbidden(
            "Only admins can manage permissions".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{AccessSource, InMemoryAccessStore};

    fn admin() -> Capabilities {
        Capabilities::derive(RoleSet::new([Role::Admin]), PermissionFlags::none())
    }

    #[test]
    fn test_draft_toggles() {
        let mut draft = AccessDraft::new(
            Uuid::new_v4(),
            AccessUpdate {
                roles: RoleSet::new([Role::Editor]),
                permissions: PermissionFlags::none(),
            },
        );

        draft.toggle_role(Role::Admin);
        assert_eq!(draft.roles.roles(), &[Role::Editor, Role::Admin]);

        draft.toggle_role(Role::Editor);
        draft.toggle_role(Role::Admin);
        assert_eq!(draft.roles, RoleSet::viewer());

        draft.toggle_permission(Permission::EditParcels);
        assert!(draft.permissions.can_edit_parcels);
        draft.toggle_permission(Permission::EditParcels);
        assert_eq!(draft.permissions, PermissionFlags::none());
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let store = Arc::new(InMemoryAccessStore::new());
        let service = AdminService::new(store.clone());
        let draft = AccessDraft::new(
            Uuid::new_v4(),
            AccessUpdate {
                roles: RoleSet::new([Role::Admin]),
                permissions: PermissionFlags::none(),
            },
        );

        let editor = Capabilities::derive(RoleSet::new([Role::Editor]), PermissionFlags::none());
        assert!(matches!(
            service.save(&editor, &draft).await,
            Err(AccessError::Forbidden(_))
        ));
        assert!(matches!(
            service.list_users(&editor).await,
            Err(AccessError::Forbidden(_))
        ));

        // An admin snapshot that is still loading is not trusted either
        assert!(matches!(
            service.save(&admin().with_loading(true), &draft).await,
            Err(AccessError::Forbidden(_))
        ));

        assert_eq!(
            store.fetch_roles(draft.user_id).await,
            Err(AccessError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_admin_edits_round_trip_through_store() {
        let store = Arc::new(InMemoryAccessStore::new());
        let user = Uuid::new_v4();
        store.add_user(user, "surveyor@homeland.co.ke", None).await;

        let service = AdminService::new(store.clone());
        let users = service.list_users(&admin()).await.unwrap();
        assert_eq!(users.len(), 1);

        let mut draft = AccessDraft::from(&users[0]);
        assert_eq!(draft.roles, RoleSet::viewer());
        draft.toggle_role(Role::Editor);
        draft.toggle_permission(Permission::AddParcels);
        service.save(&admin(), &draft).await.unwrap();

        assert_eq!(
            store.fetch_roles(user).await.unwrap().roles(),
            &[Role::Viewer, Role::Editor]
        );
        assert!(store.fetch_permission_flags(user).await.unwrap().can_add_parcels);
    }
}
