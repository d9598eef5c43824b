//! Derived capability snapshot published to consumers

use serde::{Deserialize, Serialize};

use crate::models::{Permission, PermissionFlags, Role, RoleSet};

/// What the current user may do, as last resolved.
///
/// A pure function of a [`RoleSet`] and [`PermissionFlags`] plus the
/// `loading` marker. The role booleans are independent: a user holding
/// `[admin, viewer]` has both `is_admin` and `is_viewer` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub roles: RoleSet,
    pub can_add_parcels: bool,
    pub can_edit_parcels: bool,
    pub can_delete_parcels: bool,
    pub can_add_calendar_events: bool,
    pub can_edit_calendar_events: bool,
    pub can_delete_calendar_events: bool,
    pub is_admin: bool,
    pub is_editor: bool,
    pub is_viewer: bool,
    pub loading: bool,
}

impl Capabilities {
    /// Combine a role set and permission flags into a ready snapshot
    pub fn derive(roles: RoleSet, flags: PermissionFlags) -> Self {
        Self {
            is_admin: roles.contains(Role::Admin),
            is_editor: roles.contains(Role::Editor),
            is_viewer: roles.contains(Role::Viewer),
            roles,
            can_add_parcels: flags.can_add_parcels,
            can_edit_parcels: flags.can_edit_parcels,
            can_delete_parcels: flags.can_delete_parcels,
            can_add_calendar_events: flags.can_add_calendar_events,
            can_edit_calendar_events: flags.can_edit_calendar_events,
            can_delete_calendar_events: flags.can_delete_calendar_events,
            loading: false,
        }
    }

    /// Snapshot before the first resolution for an identity completes
    pub fn initial() -> Self {
        Self::signed_out().with_loading(true)
    }

    /// Most restrictive snapshot: `[viewer]`, no permissions, not loading
    pub fn signed_out() -> Self {
        Self::derive(RoleSet::viewer(), PermissionFlags::none())
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.flags().get(permission)
    }

    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.is_admin,
            Role::Editor => self.is_editor,
            Role::Viewer => self.is_viewer,
        }
    }

    /// The permission flags this snapshot was derived from
    pub fn flags(&self) -> PermissionFlags {
        PermissionFlags {
            can_add_parcels: self.can_add_parcels,
            can_edit_parcels: self.can_edit_parcels,
            can_delete_parcels: self.can_delete_parcels,
            can_add_calendar_events: self.can_add_calendar_events,
            can_edit_calendar_events: self.can_edit_calendar_events,
            can_delete_calendar_events: self.can_delete_calendar_events,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::initial()
    }
}
