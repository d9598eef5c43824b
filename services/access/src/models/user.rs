//! User listing model for the permissions editor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::display_name;
use super::{PermissionFlags, RoleSet};

/// A user together with their stored roles and permission flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccess {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub roles: RoleSet,
    pub permissions: PermissionFlags,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserAccess {
    pub fn display_name(&self) -> String {
        display_name(self.username.as_deref(), self.email.as_deref())
    }
}

/// Roles and permission flags submitted by the permissions editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessUpdate {
    pub roles: RoleSet,
    #[serde(default)]
    pub permissions: PermissionFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>, username: Option<&str>) -> UserAccess {
        UserAccess {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            username: username.map(str::to_string),
            roles: RoleSet::viewer(),
            permissions: PermissionFlags::none(),
            updated_at: None,
        }
    }

    #[test]
    fn test_user_display_name_fallbacks() {
        assert_eq!(
            user(Some("wanjiru@homeland.co.ke"), Some("wanjiru.k")).display_name(),
            "wanjiru.k"
        );
        assert_eq!(
            user(Some("wanjiru@homeland.co.ke"), None).display_name(),
            "wanjiru"
        );
        assert_eq!(user(None, Some("")).display_name(), "Unknown User");
    }
}
