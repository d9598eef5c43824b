//! Request identity and server-side capability resolution
//!
//! The gateway in front of this service authenticates the caller and forwards
//! the user id in [`USER_ID_HEADER`]. Capabilities are resolved fresh for every
//! request with the same fallback rules the resolver uses.

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    admin::ensure_admin,
    capabilities::Capabilities,
    error::{ApiError, ApiResult},
    resolver::resolve_capabilities,
    state::AppState,
};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller of the current request
#[derive(Debug, Clone)]
pub struct ActingUser {
    pub id: Uuid,
    pub capabilities: Capabilities,
}

impl ActingUser {
    /// Fail with `403` unless the caller is an admin
    pub fn require_admin(&self) -> ApiResult<()> {
        ensure_admin(&self.capabilities).map_err(|e| {
            warn!("User {} denied admin access: {}", self.id, e);
            ApiError::Forbidden
        })
    }
}

/// Identity middleware
pub async fn acting_user_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let id = Uuid::parse_str(user_id.trim()).map_err(|e| {
        warn!("Rejected malformed {} header: {}", USER_ID_HEADER, e);
        ApiError::Unauthorized
    })?;

    let capabilities =
        resolve_capabilities(state.store.as_ref(), id, state.config.fetch_timeout()).await;
    debug!("Resolved capabilities for {}: {:?}", id, capabilities.roles);

    req.extensions_mut().insert(ActingUser { id, capabilities });

    Ok(next.run(req).await)
}
