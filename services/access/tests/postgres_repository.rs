//! Integration tests for the PostgreSQL access repository
//!
//! These tests need a reachable PostgreSQL instance with the `users`,
//! `user_roles` and `user_permissions` tables and are ignored by default.
//! Run them with `cargo test -- --ignored`.

use access::{
    AccessError, AccessSource, AccessStore, AccessWriter, Permission, PermissionFlags,
    PgAccessRepository, Role, RoleSet,
};
use common::database::{DatabaseConfig, init_pool};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    Ok(init_pool(&db_config).await?)
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_unknown_user_has_no_records() -> Result<(), Box<dyn std::error::Error>> {
    let repo = PgAccessRepository::new(pool().await?);
    assert!(repo.health_check().await?);

    let user = Uuid::new_v4();
    assert_eq!(repo.fetch_roles(user).await, Err(AccessError::NotFound));
    assert_eq!(
        repo.fetch_permission_flags(user).await,
        Err(AccessError::NotFound)
    );

    // Writing access for a user that does not exist trips the foreign key
    assert_eq!(
        repo.update_roles_and_permissions(user, &RoleSet::viewer(), &PermissionFlags::none())
            .await,
        Err(AccessError::NotFound)
    );

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_update_is_an_upsert() -> Result<(), Box<dyn std::error::Error>> {
    let pool = pool().await?;
    let repo = PgAccessRepository::new(pool.clone());
    let user = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, email, username) VALUES ($1, $2, $3)")
        .bind(user)
        .bind(format!("{}@test.homeland.co.ke", user))
        .bind("access-test")
        .execute(&pool)
        .await?;

    let roles = RoleSet::new([Role::Editor]);
    let flags = PermissionFlags::none().with(Permission::AddParcels);
    repo.update_roles_and_permissions(user, &roles, &flags)
        .await?;

    let roles = RoleSet::new([Role::Admin, Role::Viewer]);
    let flags = PermissionFlags::none().with(Permission::DeleteCalendarEvents);
    repo.update_roles_and_permissions(user, &roles, &flags)
        .await?;

    assert_eq!(repo.fetch_roles(user).await?, roles);
    assert_eq!(repo.fetch_permission_flags(user).await?, flags);

    for statement in [
        "DELETE FROM user_roles WHERE user_id = $1",
        "DELETE FROM user_permissions WHERE user_id = $1",
        "DELETE FROM users WHERE id = $1",
    ] {
        sqlx::query(statement).bind(user).execute(&pool).await?;
    }

    Ok(())
}
