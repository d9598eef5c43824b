//! Fine-grained permission flags

use serde::{Deserialize, Serialize};

/// One of the six independent capabilities a user can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    AddParcels,
    EditParcels,
    DeleteParcels,
    AddCalendarEvents,
    EditCalendarEvents,
    DeleteCalendarEvents,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::AddParcels,
        Permission::EditParcels,
        Permission::DeleteParcels,
        Permission::AddCalendarEvents,
        Permission::EditCalendarEvents,
        Permission::DeleteCalendarEvents,
    ];

    /// Column name in `user_permissions`
    pub fn column(&self) -> &'static str {
        match self {
            Permission::AddParcels => "can_add_parcels",
            Permission::EditParcels => "can_edit_parcels",
            Permission::DeleteParcels => "can_delete_parcels",
            Permission::AddCalendarEvents => "can_add_calendar_events",
            Permission::EditCalendarEvents => "can_edit_calendar_events",
            Permission::DeleteCalendarEvents => "can_delete_calendar_events",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Permission::AddParcels => "Add Parcels",
            Permission::EditParcels => "Edit Parcels",
            Permission::DeleteParcels => "Delete Parcels",
            Permission::AddCalendarEvents => "Add Calendar Events",
            Permission::EditCalendarEvents => "Edit Calendar Events",
            Permission::DeleteCalendarEvents => "Delete Calendar Events",
        }
    }
}

/// Stored permission record for one user. All flags default to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionFlags {
    pub can_add_parcels: bool,
    pub can_edit_parcels: bool,
    pub can_delete_parcels: bool,
    pub can_add_calendar_events: bool,
    pub can_edit_calendar_events: bool,
    pub can_delete_calendar_events: bool,
}

impl PermissionFlags {
    /// Flags with every permission denied
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, permission: Permission) -> bool {
        match permission {
            Permission::AddParcels => self.can_add_parcels,
            Permission::EditParcels => self.can_edit_parcels,
            Permission::DeleteParcels => self.can_delete_parcels,
            Permission::AddCalendarEvents => self.can_add_calendar_events,
            Permission::EditCalendarEvents => self.can_edit_calendar_events,
            Permission::DeleteCalendarEvents => self.can_delete_calendar_events,
        }
    }

    pub fn set(&mut self, permission: Permission, value: bool) {
        let flag = match permission {
            Permission::AddParcels => &mut self.can_add_parcels,
            Permission::EditParcels => &mut self.can_edit_parcels,
            Permission::DeleteParcels => &mut self.can_delete_parcels,
            Permission::AddCalendarEvents => &mut self.can_add_calendar_events,
            Permission::EditCalendarEvents => &mut self.can_edit_calendar_events,
            Permission::DeleteCalendarEvents => &mut self.can_delete_calendar_events,
        };
        *flag = value;
    }

    pub fn toggle(&mut self, permission: Permission) {
        self.set(permission, !self.get(permission));
    }

    /// Builder-style grant, mostly for seeding records
    pub fn with(mut self, permission: Permission) -> Self {
        self.set(permission, true);
        self
    }

    /// Permissions currently granted, in declaration order
    pub fn granted(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL.into_iter().filter(move |p| self.get(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_deny_everything() {
        let flags = PermissionFlags::none();
        assert!(Permission::ALL.iter().all(|p| !flags.get(*p)));
        assert_eq!(flags.granted().count(), 0);
    }

    #[test]
    fn test_set_and_toggle_touch_a_single_flag() {
        let mut flags = PermissionFlags::none();
        flags.toggle(Permission::DeleteCalendarEvents);
        assert!(flags.can_delete_calendar_events);
        assert_eq!(flags.granted().collect::<Vec<_>>(), vec![Permission::DeleteCalendarEvents]);

        flags.set(Permission::DeleteCalendarEvents, false);
        assert_eq!(flags, PermissionFlags::none());
    }

    #[test]
    fn test_partial_record_deserializes_with_defaults() {
        let flags: PermissionFlags = serde_json::from_str(r#"{"can_add_parcels": true}"#).unwrap();
        assert_eq!(flags, PermissionFlags::none().with(Permission::AddParcels));
    }

    #[test]
    fn test_column_names_match_serialized_fields() {
        let flags = PermissionFlags {
            can_add_parcels: true,
            can_edit_parcels: true,
            can_delete_parcels: true,
            can_add_calendar_events: true,
            can_edit_calendar_events: true,
            can_delete_calendar_events: true,
        };
        let value = serde_json::to_value(flags).unwrap();
        for permission in Permission::ALL {
            assert_eq!(value[permission.column()], serde_json::Value::Bool(true));
        }
    }
}
