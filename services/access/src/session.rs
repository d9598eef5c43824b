//! Session provider contract and the task that keeps a resolver in step with it

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::models::Identity;
use crate::repositories::AccessSource;
use crate::resolver::AuthorizationResolver;

/// Owner of the authenticated identity
pub trait SessionProvider: Send + Sync {
    /// Identity of the signed-in user, if any
    fn current_identity(&self) -> Option<Identity>;

    /// Receiver notified whenever the identity changes
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Session provider holding the identity in a watch channel
#[derive(Debug, Clone)]
pub struct SessionState {
    identity: Arc<watch::Sender<Option<Identity>>>,
}

impl SessionState {
    pub fn new(identity: Option<Identity>) -> Self {
        let (identity, _) = watch::channel(identity);
        Self {
            identity: Arc::new(identity),
        }
    }

    pub fn sign_in(&self, identity: Identity) {
        info!("Signed in as {}", identity.id);
        self.identity.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.identity.send_replace(None) {
            info!("Signed out {}", previous.id);
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionProvider for SessionState {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

/// Drive `resolver` from `provider`.
///
/// Resolves once for the identity current at call time, then again on every
/// change. Tickets are taken in notification order and fetches run on their
/// own tasks, so a newer identity supersedes an older one still in flight.
/// The task ends when the provider is dropped.
pub fn follow_session<S, P>(resolver: AuthorizationResolver<S>, provider: &P) -> JoinHandle<()>
where
    S: AccessSource + ?Sized + 'static,
    P: SessionProvider + ?Sized,
{
    let mut identities = provider.subscribe();

    tokio::spawn(async move {
        let identity = identities.borrow_and_update().clone();
        start(&resolver, identity).await;

        while identities.changed().await.is_ok() {
            let identity = identities.borrow_and_update().clone();
            start(&resolver, identity).await;
        }

        debug!("Session provider closed, no longer following identity changes");
    })
}

async fn start<S>(resolver: &AuthorizationResolver<S>, identity: Option<Identity>)
where
    S: AccessSource + ?Sized + 'static,
{
    if let Some(pass) = resolver.start_identity(identity).await {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            resolver.complete(pass).await;
        });
    }
}
