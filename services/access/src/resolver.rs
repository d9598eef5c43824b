//! Authorization resolver
//!
//! Resolves the [`Capabilities`] of the current identity from its stored
//! role set and permission flags, and publishes them as a snapshot that
//! consumers read synchronously or watch for changes.
//!
//! Every resolution pass fetches both records concurrently. A missing record,
//! a failed fetch, or a fetch exceeding the configured timeout each fall back
//! to that record's most restrictive default, independently of the other one,
//! so a pass always ends with `loading == false`.
//!
//! Passes are numbered. Only the most recently started pass may publish; a
//! pass that finishes after a newer identity change or refresh is discarded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::config::AccessConfig;
use crate::error::AccessResult;
use crate::models::Identity;
use crate::repositories::AccessSource;

/// Resolver tuning
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Upper bound for each of the two record fetches
    pub fetch_timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&AccessConfig> for ResolverOptions {
    fn from(config: &AccessConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// Lifecycle of the published snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Nothing resolved yet
    Uninitialized,
    /// A pass is in flight
    Loading,
    /// The snapshot reflects the latest pass
    Ready,
}

#[derive(Debug)]
struct Current {
    ticket: u64,
    identity: Option<Identity>,
    state: ResolutionState,
}

/// Resolves and publishes capabilities for one identity at a time
pub struct AuthorizationResolver<S: ?Sized> {
    source: Arc<S>,
    options: ResolverOptions,
    current: Arc<Mutex<Current>>,
    snapshot: Arc<watch::Sender<Capabilities>>,
}

impl<S: ?Sized> Clone for AuthorizationResolver<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options: self.options,
            current: Arc::clone(&self.current),
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

impl<S: AccessSource + ?Sized> AuthorizationResolver<S> {
    /// Create a resolver for `identity`. Nothing is fetched until the first
    /// [`refresh`](Self::refresh) or [`set_identity`](Self::set_identity).
    pub fn new(source: Arc<S>, identity: Option<Identity>, options: ResolverOptions) -> Self {
        let (snapshot, _) = watch::channel(Capabilities::initial());

        Self {
            source,
            options,
            current: Arc::new(Mutex::new(Current {
                ticket: 0,
                identity,
                state: ResolutionState::Uninitialized,
            })),
            snapshot: Arc::new(snapshot),
        }
    }

    /// Latest published capabilities
    pub fn snapshot(&self) -> Capabilities {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Capabilities> {
        self.snapshot.subscribe()
    }

    pub async fn state(&self) -> ResolutionState {
        self.current.lock().await.state
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.current.lock().await.identity.clone()
    }

    /// Switch to another identity (or sign out) and resolve for it.
    ///
    /// A different identity starts from [`Capabilities::initial`]; the same
    /// identity delivered again is treated as a refresh. Returns the snapshot
    /// published once this pass settles, or the newer one if it was superseded.
    pub async fn set_identity(&self, identity: Option<Identity>) -> Capabilities {
        match self.start_identity(identity).await {
            Some(pass) => self.complete(pass).await,
            None => self.snapshot(),
        }
    }

    /// Re-resolve for the current identity.
    ///
    /// The last snapshot stays visible with `loading == true` until the pass
    /// settles. The latest call wins when several overlap.
    pub async fn refresh(&self) -> Capabilities {
        match self.start_refresh().await {
            Some(pass) => self.complete(pass).await,
            None => self.snapshot(),
        }
    }

    /// First half of [`set_identity`](Self::set_identity): record the
    /// identity and take a ticket. `None` when no fetch is needed.
    pub(crate) async fn start_identity(&self, identity: Option<Identity>) -> Option<PendingPass> {
        let mut current = self.current.lock().await;
        let changed = current.identity.as_ref().map(|i| i.id) != identity.as_ref().map(|i| i.id);
        if changed {
            info!(
                "Identity changed to {}",
                identity
                    .as_ref()
                    .map(|i| i.id.to_string())
                    .unwrap_or_else(|| "<signed out>".to_string())
            );
        }
        current.identity = identity;
        self.begin_pass(&mut current, changed)
    }

    /// First half of [`refresh`](Self::refresh)
    pub(crate) async fn start_refresh(&self) -> Option<PendingPass> {
        let mut current = self.current.lock().await;
        self.begin_pass(&mut current, false)
    }

    /// Take a new ticket and publish the loading snapshot. Signed-out
    /// resolution needs no fetch and completes here, returning `None`.
    fn begin_pass(&self, current: &mut Current, reset: bool) -> Option<PendingPass> {
        current.ticket += 1;

        let Some(identity) = current.identity.clone() else {
            current.state = ResolutionState::Ready;
            self.snapshot.send_replace(Capabilities::signed_out());
            return None;
        };

        if reset || current.state == ResolutionState::Uninitialized {
            self.snapshot.send_replace(Capabilities::initial());
        } else {
            self.snapshot.send_modify(|caps| caps.loading = true);
        }
        current.state = ResolutionState::Loading;

        Some(PendingPass {
            ticket: current.ticket,
            identity,
        })
    }

    /// Fetch for a started pass and publish the result unless a newer pass
    /// has started in the meantime.
    pub(crate) async fn complete(&self, pass: PendingPass) -> Capabilities {
        let resolved = resolve_capabilities(
            self.source.as_ref(),
            pass.identity.id,
            self.options.fetch_timeout,
        )
        .await;

        let mut current = self.current.lock().await;
        if current.ticket != pass.ticket {
            debug!(
                "Discarding capability resolution {} superseded by {}",
                pass.ticket, current.ticket
            );
            return self.snapshot();
        }

        current.state = ResolutionState::Ready;
        self.snapshot.send_replace(resolved.clone());
        resolved
    }
}

/// A started resolution pass: it holds a ticket but has not fetched yet
#[derive(Debug)]
pub(crate) struct PendingPass {
    ticket: u64,
    identity: Identity,
}

/// Resolve capabilities for one user without publishing them.
///
/// Fetches roles and permission flags concurrently and substitutes the
/// default of whichever side is missing, failed, or timed out.
pub async fn resolve_capabilities<S: AccessSource + ?Sized>(
    source: &S,
    user_id: Uuid,
    fetch_timeout: Duration,
) -> Capabilities {
    let (roles, permissions) = tokio::join!(
        or_default(source.fetch_roles(user_id), fetch_timeout, "roles", user_id),
        or_default(
            source.fetch_permission_flags(user_id),
            fetch_timeout,
            "permissions",
            user_id
        ),
    );

    Capabilities::derive(roles, permissions)
}

async fn or_default<T: Default>(
    fetch: impl Future<Output = AccessResult<T>>,
    fetch_timeout: Duration,
    what: &str,
    user_id: Uuid,
) -> T {
    match tokio::time::timeout(fetch_timeout, fetch).await {
        Ok(Ok(value)) => value,
        Ok(Err(e)) if e.is_not_found() => {
            debug!("No {} record for user {}, using defaults", what, user_id);
            T::default()
        }
        Ok(Err(e)) => {
            error!("Error fetching {} for user {}: {}", what, user_id, e);
            T::default()
        }
        Err(_) => {
            error!(
                "Timed out fetching {} for user {} after {:?}",
                what, user_id, fetch_timeout
            );
            T::default()
        }
    }
}
