//! In-memory access store
//!
//! Backs local development and tests. Latency and failures can be injected
//! per user to exercise the resolver's fallback and staleness handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccessSource, AccessStore, AccessWriter};
use crate::error::{AccessError, AccessResult};
use crate::models::{PermissionFlags, RoleSet, UserAccess};

#[derive(Debug, Clone, Default)]
struct StoredUser {
    email: Option<String>,
    username: Option<String>,
    roles: Option<RoleSet>,
    permissions: Option<PermissionFlags>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: BTreeMap<Uuid, StoredUser>,
    latency: HashMap<Uuid, Duration>,
    role_failures: HashMap<Uuid, AccessError>,
    permission_failures: HashMap<Uuid, AccessError>,
}

/// Access store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessStore {
    state: Arc<RwLock<StoreState>>,
    fetches: Arc<AtomicUsize>,
}

impl InMemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user without any access records
    pub async fn add_user(&self, user_id: Uuid, email: &str, username: Option<&str>) {
        let mut state = self.state.write().await;
        let user = state.users.entry(user_id).or_default();
        user.email = Some(email.to_string());
        user.username = username.map(str::to_string);
    }

    pub async fn put_roles(&self, user_id: Uuid, roles: RoleSet) {
        let mut state = self.state.write().await;
        state.users.entry(user_id).or_default().roles = Some(roles);
    }

    pub async fn put_permissions(&self, user_id: Uuid, permissions: PermissionFlags) {
        let mut state = self.state.write().await;
        state.users.entry(user_id).or_default().permissions = Some(permissions);
    }

    /// Delay every fetch for this user. The record is read before the delay.
    pub async fn set_latency(&self, user_id: Uuid, latency: Duration) {
        self.state.write().await.latency.insert(user_id, latency);
    }

    pub async fn fail_roles_with(&self, user_id: Uuid, err: AccessError) {
        self.state.write().await.role_failures.insert(user_id, err);
    }

    pub async fn fail_permissions_with(&self, user_id: Uuid, err: AccessError) {
        self.state
            .write()
            .await
            .permission_failures
            .insert(user_id, err);
    }

    pub async fn clear_failures(&self, user_id: Uuid) {
        let mut state = self.state.write().await;
        state.role_failures.remove(&user_id);
        state.permission_failures.remove(&user_id);
    }

    /// Number of fetch calls served so far, across both record kinds
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn respond<T>(
        &self,
        user_id: Uuid,
        read: impl FnOnce(&StoreState) -> AccessResult<T>,
    ) -> AccessResult<T> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let (result, latency) = {
            let state = self.state.read().await;
            (read(&state), state.latency.get(&user_id).copied())
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        result
    }
}

#[async_trait]
impl AccessSource for InMemoryAccessStore {
    async fn fetch_roles(&self, user_id: Uuid) -> AccessResult<RoleSet> {
        self.respond(user_id, |state| {
            if let Some(err) = state.role_failures.get(&user_id) {
                return Err(err.clone());
            }
            state
                .users
                .get(&user_id)
                .and_then(|u| u.roles.clone())
                .ok_or(AccessError::NotFound)
        })
        .await
    }

    async fn fetch_permission_flags(&self, user_id: Uuid) -> AccessResult<PermissionFlags> {
        self.respond(user_id, |state| {
            if let Some(err) = state.permission_failures.get(&user_id) {
                return Err(err.clone());
            }
            state
                .users
                .get(&user_id)
                .and_then(|u| u.permissions)
                .ok_or(AccessError::NotFound)
        })
        .await
    }
}

#[async_trait]
impl AccessWriter for InMemoryAccessStore {
    async fn update_roles_and_permissions(
        &self,
        user_id: Uuid,
        roles: &RoleSet,
        permissions: &PermissionFlags,
    ) -> AccessResult<()> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&user_id).ok_or(AccessError::NotFound)?;
        user.roles = Some(roles.clone());
        user.permissions = Some(*permissions);
        user.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn list_users_with_access(&self) -> AccessResult<Vec<UserAccess>> {
        let state = self.state.read().await;
        let mut users: Vec<UserAccess> = state
            .users
            .iter()
            .map(|(id, user)| UserAccess {
                id: *id,
                email: user.email.clone(),
                username: user.username.clone(),
                roles: user.roles.clone().unwrap_or_default(),
                permissions: user.permissions.unwrap_or_default(),
                updated_at: user.updated_at,
            })
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}

#[async_trait]
impl AccessStore for InMemoryAccessStore {
    async fn health_check(&self) -> AccessResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Permission, Role};

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let store = InMemoryAccessStore::new();
        let id = Uuid::new_v4();
        store.add_user(id, "a@b.co", None).await;

        assert_eq!(store.fetch_roles(id).await, Err(AccessError::NotFound));
        assert_eq!(
            store.fetch_permission_flags(id).await,
            Err(AccessError::NotFound)
        );
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_update_then_list() {
        let store = InMemoryAccessStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.add_user(b, "zed@homeland.co.ke", None).await;
        store.add_user(a, "amy@homeland.co.ke", Some("amy")).await;

        let flags = PermissionFlags::none().with(Permission::AddParcels);
        store
            .update_roles_and_permissions(a, &RoleSet::new([Role::Editor]), &flags)
            .await
            .unwrap();

        let users = store.list_users_with_access().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, a);
        assert_eq!(users[0].roles.roles(), &[Role::Editor]);
        assert_eq!(users[0].permissions, flags);
        assert!(users[0].updated_at.is_some());
        assert_eq!(users[1].roles, RoleSet::viewer());
        assert_eq!(users[1].permissions, PermissionFlags::none());
    }

    #[tokio::test]
    async fn test_update_for_unknown_user_is_not_found() {
        let store = InMemoryAccessStore::new();
        let id = Uuid::new_v4();

        assert_eq!(
            store
                .update_roles_and_permissions(id, &RoleSet::viewer(), &PermissionFlags::none())
                .await,
            Err(AccessError::NotFound)
        );
        assert!(store.list_users_with_access().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned() {
        let store = InMemoryAccessStore::new();
        let id = Uuid::new_v4();
        store.put_roles(id, RoleSet::viewer()).await;
        store
            .fail_roles_with(id, AccessError::Transport("connection reset".into()))
            .await;

        assert!(matches!(
            store.fetch_roles(id).await,
            Err(AccessError::Transport(_))
        ));

        store.clear_failures(id).await;
        assert_eq!(store.fetch_roles(id).await, Ok(RoleSet::viewer()));
    }
}
