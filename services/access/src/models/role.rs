//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::AccessError;

/// Coarse role tag assigned to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    /// Every role, in the order the permissions editor lists them
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    /// Tag as stored in `user_roles.roles`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(AccessError::InvalidInput(format!("unknown role: {}", other))),
        }
    }
}

/// Non-empty set of role tags held by one user.
///
/// Roles are additive, not ranked: a user may hold all three at once. The
/// set keeps the order in which the tags were stored and never becomes
/// empty; anything that would empty it falls back to `[viewer]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// The default role set, `[viewer]`
    pub fn viewer() -> Self {
        RoleSet(vec![Role::Viewer])
    }

    /// Build a role set, dropping duplicates
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = Vec::new();
        for role in roles {
            if !set.contains(&role) {
                set.push(role);
            }
        }

        if set.is_empty() {
            return Self::viewer();
        }

        RoleSet(set)
    }

    /// Build a role set from stored tags, ignoring tags this build does not know
    pub fn from_stored<S: AsRef<str>>(tags: &[S]) -> Self {
        let roles = tags.iter().filter_map(|tag| match tag.as_ref().parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                warn!("Ignoring unknown role tag: {}", tag.as_ref());
                None
            }
        });

        Self::new(roles)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &[Role] {
        &self.0
    }

    /// Add the role if absent, remove it if present.
    ///
    /// Removing the last remaining role leaves `[viewer]`.
    pub fn toggle(&mut self, role: Role) {
        if self.contains(role) {
            self.0.retain(|r| *r != role);
            if self.0.is_empty() {
                self.0.push(Role::Viewer);
            }
        } else {
            self.0.push(role);
        }
    }

    /// Tags in the form stored by the database
    pub fn to_tags(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::viewer()
    }
}

impl From<Vec<Role>> for RoleSet {
    fn from(roles: Vec<Role>) -> Self {
        RoleSet::new(roles)
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_role_set_falls_back_to_viewer() {
        assert_eq!(RoleSet::new([]), RoleSet::viewer());
        assert_eq!(RoleSet::from_stored::<&str>(&[]), RoleSet::viewer());
    }

    #[test]
    fn test_from_stored_ignores_unknown_and_duplicates() {
        let set = RoleSet::from_stored(&["admin", "superuser", "admin", "viewer"]);
        assert_eq!(set.roles(), &[Role::Admin, Role::Viewer]);

        let set = RoleSet::from_stored(&["owner"]);
        assert_eq!(set, RoleSet::viewer());
    }

    #[test]
    fn test_toggle_keeps_at_least_viewer() {
        let mut set = RoleSet::viewer();
        set.toggle(Role::Viewer);
        assert_eq!(set.roles(), &[Role::Viewer]);

        set.toggle(Role::Editor);
        assert_eq!(set.roles(), &[Role::Viewer, Role::Editor]);

        set.toggle(Role::Viewer);
        assert_eq!(set.roles(), &[Role::Editor]);

        set.toggle(Role::Editor);
        assert_eq!(set.roles(), &[Role::Viewer]);
    }

    #[test]
    fn test_serde_uses_lowercase_tags() {
        let set = RoleSet::new([Role::Admin, Role::Viewer]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["admin","viewer"]"#);

        let parsed: RoleSet = serde_json::from_str(r#"["editor","editor"]"#).unwrap();
        assert_eq!(parsed.roles(), &[Role::Editor]);

        let parsed: RoleSet = serde_json::from_str("[]").unwrap();
        assert_eq!(parsed, RoleSet::viewer());

        assert!(serde_json::from_str::<RoleSet>(r#"["root"]"#).is_err());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("editor".parse::<Role>().unwrap(), Role::Editor);
        assert!(matches!(
            "Editor".parse::<Role>(),
            Err(AccessError::InvalidInput(_))
        ));
    }
}
