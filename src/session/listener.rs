use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::identity::{IdentityProvider, SessionCallback, Subscription};
use crate::session::store::SessionStore;

/// Bridges identity-provider session notifications into the store.
///
/// One subscription per shell instance; the callback applies every
/// notification unconditionally (remote sign-out, token refresh, signed in
/// elsewhere) and the store handles idempotence. After `stop`, late
/// deliveries are dropped instead of reaching the store.
pub struct SessionChangeListener {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
    subscription: Mutex<Option<Subscription>>,
    stopped: Arc<AtomicBool>,
}

impl SessionChangeListener {
    /// Create a listener for the given provider and store
    pub fn new(provider: Arc<dyn IdentityProvider>, store: SessionStore) -> Self {
        Self {
            provider,
            store,
            subscription: Mutex::new(None),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register the provider subscription.
    ///
    /// A subscription failure is a non-fatal background condition: the shell
    /// keeps running without live updates and `initializing` resolution stays
    /// with the store's bootstrap.
    pub async fn start(&self) {
        let mut slot = self.subscription.lock().await;
        if slot.is_some() {
            debug!("session change listener already started");
            return;
        }

        let store = self.store.clone();
        let stopped = Arc::clone(&self.stopped);
        let callback: SessionCallback = Arc::new(move |session| {
            if stopped.load(Ordering::SeqCst) {
                debug!("listener stopped, dropping session notification");
                return;
            }
            store.replace(session);
        });

        match self.provider.on_session_change(callback) {
            Ok(subscription) => {
                *slot = Some(subscription);
                debug!("subscribed to session changes");
            }
            Err(e) => {
                warn!(error = %e, "could not subscribe to session changes, continuing without live updates");
            }
        }
    }

    /// Release the subscription. Safe to call repeatedly; afterwards no
    /// notification reaches the store.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(subscription) = self.subscription.lock().await.take() {
            subscription.unsubscribe();
            debug!("session change subscription released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityError;
    use crate::identity::memory::InMemoryIdentity;
    use crate::identity::SignUpResponse;
    use crate::session::{Principal, Session};
    use async_trait::async_trait;

    fn session_for(email: &str) -> Session {
        Session::new(
            format!("tok-{}", email),
            None,
            Principal {
                id: "u1".to_string(),
                email: email.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn forwards_notifications_into_store() {
        let identity = Arc::new(InMemoryIdentity::new());
        let provider: Arc<dyn IdentityProvider> = identity.clone();
        let store = SessionStore::new();
        let listener = SessionChangeListener::new(provider, store.clone());

        listener.start().await;
        identity.emit(Some(session_for("a@b.com"))).await;

        assert_eq!(store.snapshot().principal().unwrap().email, "a@b.com");

        identity.emit(None).await;
        assert!(store.snapshot().session.is_none());
    }

    #[tokio::test]
    async fn notification_after_stop_leaves_store_unchanged() {
        let identity = Arc::new(InMemoryIdentity::new());
        let provider: Arc<dyn IdentityProvider> = identity.clone();
        let store = SessionStore::new();
        let listener = SessionChangeListener::new(provider, store.clone());

        listener.start().await;
        identity.emit(Some(session_for("a@b.com"))).await;
        listener.stop().await;

        identity.emit(None).await;
        let state = store.snapshot();
        assert_eq!(state.principal().unwrap().email, "a@b.com");
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let identity = Arc::new(InMemoryIdentity::new());
        let provider: Arc<dyn IdentityProvider> = identity;
        let listener = SessionChangeListener::new(provider, SessionStore::new());

        listener.start().await;
        listener.stop().await;
        listener.stop().await;
    }

    #[tokio::test]
    async fn subscription_failure_is_non_fatal() {
        #[derive(Debug)]
        struct NoSubscriptions;

        #[async_trait]
        impl IdentityProvider for NoSubscriptions {
            async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
                Ok(None)
            }

            fn on_session_change(
                &self,
                _callback: SessionCallback,
            ) -> Result<Subscription, IdentityError> {
                Err(IdentityError::unavailable("subscriptions down"))
            }

            async fn sign_in_with_password(
                &self,
                _email: &str,
                _password: &str,
            ) -> Result<Session, IdentityError> {
                Err(IdentityError::rejected("not supported"))
            }

            async fn sign_up(
                &self,
                _email: &str,
                _password: &str,
            ) -> Result<SignUpResponse, IdentityError> {
                Err(IdentityError::rejected("not supported"))
            }

            async fn sign_out(&self) -> Result<(), IdentityError> {
                Ok(())
            }
        }

        let provider: Arc<dyn IdentityProvider> = Arc::new(NoSubscriptions);
        let store = SessionStore::new();
        let listener = SessionChangeListener::new(provider, store.clone());

        listener.start().await;
        listener.stop().await;

        // The store is untouched and initializing resolution stays with
        // the bootstrap path.
        assert!(store.snapshot().initializing);
    }
}
