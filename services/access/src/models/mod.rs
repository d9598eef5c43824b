//! Access control models

pub mod identity;
pub mod permission;
pub mod role;
pub mod user;

// Re-export for convenience
pub use identity::Identity;
pub use permission::{Permission, PermissionFlags};
pub use role::{Role, RoleSet};
pub use user::{AccessUpdate, UserAccess};
