//! PostgreSQL repository for `user_roles` and `user_permissions`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::{AccessSource, AccessStore, AccessWriter};
use crate::error::{AccessError, AccessResult};
use crate::models::{PermissionFlags, RoleSet, UserAccess};

/// Access repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgAccessRepository {
    pool: PgPool,
}

impl PgAccessRepository {
    /// Create a new access repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn roles_from_row(row: &PgRow) -> AccessResult<RoleSet> {
    let tags: Option<Vec<String>> = row.try_get("roles").map_err(AccessError::from_sqlx)?;
    Ok(RoleSet::from_stored(&tags.unwrap_or_default()))
}

fn flags_from_row(row: &PgRow) -> AccessResult<PermissionFlags> {
    let flag = |column: &str| -> AccessResult<bool> {
        let value: Option<bool> = row.try_get(column).map_err(AccessError::from_sqlx)?;
        Ok(value.unwrap_or(false))
    };

    Ok(PermissionFlags {
        can_add_parcels: flag("can_add_parcels")?,
        can_edit_parcels: flag("can_edit_parcels")?,
        can_delete_parcels: flag("can_delete_parcels")?,
        can_add_calendar_events: flag("can_add_calendar_events")?,
        can_edit_calendar_events: flag("can_edit_calendar_events")?,
        can_delete_calendar_events: flag("can_delete_calendar_events")?,
    })
}

#[async_trait]
impl AccessSource for PgAccessRepository {
    async fn fetch_roles(&self, user_id: Uuid) -> AccessResult<RoleSet> {
        let row = sqlx::query(
            r#"
            SELECT roles
            FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AccessError::from_sqlx)?;

        match row {
            Some(row) => roles_from_row(&row),
            None => Err(AccessError::NotFound),
        }
    }

    async fn fetch_permission_flags(&self, user_id: Uuid) -> AccessResult<PermissionFlags> {
        let row = sqlx::query(
            r#"
            SELECT can_add_parcels, can_edit_parcels, can_delete_parcels,
                   can_add_calendar_events, can_edit_calendar_events, can_delete_calendar_events
            FROM user_permissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AccessError::from_sqlx)?;

        match row {
            Some(row) => flags_from_row(&row),
            None => Err(AccessError::NotFound),
        }
    }
}

#[async_trait]
impl AccessWriter for PgAccessRepository {
    async fn update_roles_and_permissions(
        &self,
        user_id: Uuid,
        roles: &RoleSet,
        permissions: &PermissionFlags,
    ) -> AccessResult<()> {
        info!("Updating roles and permissions for user: {}", user_id);

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AccessError::from_sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, roles, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET roles = EXCLUDED.roles, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(roles.to_tags())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AccessError::from_sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO user_permissions (
                user_id, can_add_parcels, can_edit_parcels, can_delete_parcels,
                can_add_calendar_events, can_edit_calendar_events, can_delete_calendar_events,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id)
            DO UPDATE SET
                can_add_parcels = EXCLUDED.can_add_parcels,
                can_edit_parcels = EXCLUDED.can_edit_parcels,
                can_delete_parcels = EXCLUDED.can_delete_parcels,
                can_add_calendar_events = EXCLUDED.can_add_calendar_events,
                can_edit_calendar_events = EXCLUDED.can_edit_calendar_events,
                can_delete_calendar_events = EXCLUDED.can_delete_calendar_events,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(permissions.can_add_parcels)
        .bind(permissions.can_edit_parcels)
        .bind(permissions.can_delete_parcels)
        .bind(permissions.can_add_calendar_events)
        .bind(permissions.can_edit_calendar_events)
        .bind(permissions.can_delete_calendar_events)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AccessError::from_sqlx)?;

        tx.commit().await.map_err(AccessError::from_sqlx)?;

        Ok(())
    }

    async fn list_users_with_access(&self) -> AccessResult<Vec<UserAccess>> {
        info!("Listing users with roles and permissions");

        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.username, r.roles,
                   p.can_add_parcels, p.can_edit_parcels, p.can_delete_parcels,
                   p.can_add_calendar_events, p.can_edit_calendar_events,
                   p.can_delete_calendar_events,
                   GREATEST(r.updated_at, p.updated_at) AS updated_at
            FROM users u
            LEFT JOIN user_roles r ON r.user_id = u.id
            LEFT JOIN user_permissions p ON p.user_id = u.id
            ORDER BY u.email
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AccessError::from_sqlx)?;

        rows.iter()
            .map(|row| {
                let updated_at: Option<DateTime<Utc>> =
                    row.try_get("updated_at").map_err(AccessError::from_sqlx)?;

                Ok(UserAccess {
                    id: row.try_get("id").map_err(AccessError::from_sqlx)?,
                    email: row.try_get("email").map_err(AccessError::from_sqlx)?,
                    username: row.try_get("username").map_err(AccessError::from_sqlx)?,
                    roles: roles_from_row(row)?,
                    permissions: flags_from_row(row)?,
                    updated_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AccessStore for PgAccessRepository {
    async fn health_check(&self) -> AccessResult<bool> {
        Ok(common::database::health_check(&self.pool).await?)
    }
}
