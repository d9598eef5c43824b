//! Access service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    admin::AccessDraft,
    error::ApiError,
    middleware::{ActingUser, acting_user_middleware},
    models::AccessUpdate,
};

/// Create the router for the access service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/me/capabilities", get(get_my_capabilities))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/access", put(update_user_access))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            acting_user_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!("Access store health check failed: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(json!({
        "status": "ok",
        "service": "access-service"
    })))
}

/// Capabilities of the calling user
pub async fn get_my_capabilities(Extension(user): Extension<ActingUser>) -> impl IntoResponse {
    Json(user.capabilities)
}

/// Every user with their roles and permission flags
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;

    let users = state.admin.list_users(&user.capabilities).await?;

    Ok(Json(users))
}

/// Replace a user's roles and permission flags
pub async fn update_user_access(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccessUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;

    let draft = AccessDraft::new(id, payload);
    state.admin.save(&user.capabilities, &draft).await?;

    tracing::info!("User {} updated access for {}", user.id, id);

    Ok(Json(AccessUpdate {
        roles: draft.roles,
        permissions: draft.permissions,
    }))
}
