//! How record views consume a [`Capabilities`] snapshot
//!
//! Non-destructive content renders as soon as the view does. Controls that
//! trigger a mutation stay [`ControlState::Pending`] until the snapshot has
//! settled, then show or hide on the matching capability. Hiding a control is
//! advisory; the write paths re-check the same predicate.

use serde::Serialize;
use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::models::{Identity, Permission};

/// A gated action offered by one of the record views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    AddParcel,
    EditParcel,
    DeleteParcel,
    AddCalendarEvent,
    EditCalendarEvent,
    DeleteCalendarEvent,
    ManagePermissions,
    DownloadDocument,
}

impl Control {
    /// Whether using the control changes stored data
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Control::DownloadDocument)
    }

    fn permitted(&self, caps: &Capabilities) -> bool {
        match self {
            Control::AddParcel => caps.allows(Permission::AddParcels),
            Control::EditParcel => caps.allows(Permission::EditParcels),
            Control::DeleteParcel => caps.allows(Permission::DeleteParcels),
            Control::AddCalendarEvent => caps.allows(Permission::AddCalendarEvents),
            Control::EditCalendarEvent => caps.allows(Permission::EditCalendarEvents),
            Control::DeleteCalendarEvent => caps.allows(Permission::DeleteCalendarEvents),
            Control::ManagePermissions => caps.is_admin,
            Control::DownloadDocument => true,
        }
    }
}

/// Rendering state of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    Shown,
    Hidden,
    /// Capabilities are still loading
    Pending,
}

pub fn control_state(caps: &Capabilities, control: Control) -> ControlState {
    if control.is_mutating() && caps.loading {
        return ControlState::Pending;
    }

    if control.permitted(caps) {
        ControlState::Shown
    } else {
        ControlState::Hidden
    }
}

/// Which calendar activities a user gets to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityScope {
    /// Every activity in the system
    All,
    /// Only activities created by this user
    OwnedBy(Uuid),
}

impl ActivityScope {
    pub fn includes(&self, created_by: Uuid) -> bool {
        match self {
            ActivityScope::All => true,
            ActivityScope::OwnedBy(owner) => *owner == created_by,
        }
    }
}

/// Listing scope for the calendar, `None` until capabilities are known
pub fn activity_scope(caps: &Capabilities, identity: &Identity) -> Option<ActivityScope> {
    if caps.loading {
        return None;
    }

    if caps.is_admin {
        Some(ActivityScope::All)
    } else {
        Some(ActivityScope::OwnedBy(identity.id))
    }
}

/// Route the permissions page sends non-admins back to
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Access to the permissions management view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminViewAccess {
    Pending,
    Granted,
    Denied { redirect_to: String },
}

pub fn admin_view_access(caps: &Capabilities) -> AdminViewAccess {
    if caps.loading {
        AdminViewAccess::Pending
    } else if caps.is_admin {
        AdminViewAccess::Granted
    } else {
        AdminViewAccess::Denied {
            redirect_to: DASHBOARD_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PermissionFlags, Role, RoleSet};

    fn editor_with(flags: PermissionFlags) -> Capabilities {
        Capabilities::derive(RoleSet::new([Role::Editor]), flags)
    }

    #[test]
    fn test_controls_follow_permission_flags() {
        let caps = editor_with(
            PermissionFlags::none()
                .with(Permission::AddParcels)
                .with(Permission::DeleteCalendarEvents),
        );

        assert_eq!(control_state(&caps, Control::AddParcel), ControlState::Shown);
        assert_eq!(control_state(&caps, Control::EditParcel), ControlState::Hidden);
        assert_eq!(
            control_state(&caps, Control::DeleteCalendarEvent),
            ControlState::Shown
        );
        assert_eq!(
            control_state(&caps, Control::ManagePermissions),
            ControlState::Hidden
        );
    }

    #[test]
    fn test_admin_role_does_not_imply_flags() {
        let caps = Capabilities::derive(RoleSet::new([Role::Admin]), PermissionFlags::none());

        assert_eq!(
            control_state(&caps, Control::ManagePermissions),
            ControlState::Shown
        );
        assert_eq!(control_state(&caps, Control::AddParcel), ControlState::Hidden);
    }

    #[test]
    fn test_mutating_controls_wait_for_loading() {
        let caps = editor_with(PermissionFlags::none().with(Permission::AddParcels)).with_loading(true);

        assert_eq!(control_state(&caps, Control::AddParcel), ControlState::Pending);
        assert_eq!(
            control_state(&caps, Control::DeleteParcel),
            ControlState::Pending
        );
        assert_eq!(
            control_state(&caps, Control::DownloadDocument),
            ControlState::Shown
        );
    }

    #[test]
    fn test_activity_scope() {
        let identity = Identity::new(Uuid::new_v4(), "clerk@homeland.co.ke");
        let other = Uuid::new_v4();

        assert_eq!(activity_scope(&Capabilities::initial(), &identity), None);

        let scope = activity_scope(&Capabilities::signed_out(), &identity).unwrap();
        assert_eq!(scope, ActivityScope::OwnedBy(identity.id));
        assert!(scope.includes(identity.id));
        assert!(!scope.includes(other));

        let admin = Capabilities::derive(RoleSet::new([Role::Admin]), PermissionFlags::none());
        let scope = activity_scope(&admin, &identity).unwrap();
        assert_eq!(scope, ActivityScope::All);
        assert!(scope.includes(other));
    }

    #[test]
    fn test_admin_view_access() {
        assert_eq!(
            admin_view_access(&Capabilities::initial()),
            AdminViewAccess::Pending
        );
        assert_eq!(
            admin_view_access(&Capabilities::signed_out()),
            AdminViewAccess::Denied {
                redirect_to: "/dashboard".to_string()
            }
        );

        let admin = Capabilities::derive(
            RoleSet::new([Role::Admin, Role::Viewer]),
            PermissionFlags::none(),
        );
        assert_eq!(admin_view_access(&admin), AdminViewAccess::Granted);
    }
}
