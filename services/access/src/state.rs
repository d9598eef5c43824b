//! Application state shared across handlers

use std::sync::Arc;

use crate::admin::AdminService;
use crate::config::AccessConfig;
use crate::repositories::AccessStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccessStore>,
    pub admin: AdminService<dyn AccessStore>,
    pub config: AccessConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn AccessStore>, config: AccessConfig) -> Self {
        Self {
            admin: AdminService::new(Arc::clone(&store)),
            store,
            config,
        }
    }
}
