//! Access control for the Homeland land records system
//!
//! The core is the [`AuthorizationResolver`]: it combines a user's stored
//! [`RoleSet`] and [`PermissionFlags`] into a [`Capabilities`] snapshot that
//! views use to decide which controls to offer. Missing records, failed
//! fetches and timeouts all resolve to the most restrictive defaults.
//!
//! The snapshot is advisory. Every write exposed by [`routes`] re-resolves
//! the caller's capabilities and checks them again server-side.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use access::{AuthorizationResolver, InMemoryAccessStore, ResolverOptions, SessionState, follow_session};
//!
//! # async fn run() {
//! let store = Arc::new(InMemoryAccessStore::new());
//! let session = SessionState::default();
//! let resolver = AuthorizationResolver::new(store, None, ResolverOptions::default());
//!
//! let _follower = follow_session(resolver.clone(), &session);
//! let caps = resolver.snapshot();
//! assert!(caps.is_viewer);
//! # }
//! ```

pub mod admin;
pub mod capabilities;
pub mod config;
pub mod controls;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod models;
pub mod parcel;
pub mod repositories;
pub mod resolver;
pub mod routes;
pub mod session;
pub mod state;

pub use admin::{AccessDraft, AdminService};
pub use capabilities::Capabilities;
pub use config::AccessConfig;
pub use error::{AccessError, AccessResult, ApiError};
pub use gate::{GateDecision, ViewGate};
pub use models::{Identity, Permission, PermissionFlags, Role, RoleSet, UserAccess};
pub use repositories::{
    AccessSource, AccessStore, AccessWriter, InMemoryAccessStore, PgAccessRepository,
};
pub use resolver::{AuthorizationResolver, ResolutionState, ResolverOptions, resolve_capabilities};
pub use session::{SessionProvider, SessionState, follow_session};
pub use state::AppState;
