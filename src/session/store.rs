use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::common::retry::{exponential_backoff, with_jitter, with_retry_and_backoff};
use crate::identity::IdentityProvider;
use crate::session::{Session, SessionState};

/// Single source of truth for the current session.
///
/// The state lives inside a watch channel: `replace` and `snapshot` are
/// synchronous, every write fully applies before watchers are notified, and
/// writes serialize in the order their triggering events occur (last write
/// wins). Cloning the store shares the same underlying state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<SessionState>,
    /// Serializes bootstrap so concurrent `initialize` calls issue exactly
    /// one provider query.
    bootstrapped: Mutex<bool>,
}

impl SessionStore {
    /// Create a store in the bootstrap state (`initializing = true`, no
    /// session).
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::bootstrap());
        Self {
            inner: Arc::new(StoreInner {
                state,
                bootstrapped: Mutex::new(false),
            }),
        }
    }

    /// Resolve any pre-existing session from the provider, exactly once.
    ///
    /// Transport failures are retried with exponential backoff; once retries
    /// are exhausted the store degrades to "signed out" rather than failing
    /// the application. A concurrent duplicate call waits on the first and
    /// observes the same resolved state without issuing a second query.
    pub async fn initialize(
        &self,
        provider: &Arc<dyn IdentityProvider>,
        attempts: usize,
    ) -> SessionState {
        let mut done = self.inner.bootstrapped.lock().await;
        if *done {
            debug!("session store already bootstrapped");
            return self.snapshot();
        }

        let query_provider = Arc::clone(provider);
        let result = with_retry_and_backoff(
            move || {
                let provider = Arc::clone(&query_provider);
                Box::pin(async move { provider.current_session().await })
            },
            attempts,
            "session bootstrap",
            with_jitter(exponential_backoff(100, Some(2000))),
        )
        .await;

        let session = match result {
            Ok(session) => {
                info!(
                    authenticated = session.is_some(),
                    "session bootstrap resolved"
                );
                session
            }
            Err(e) => {
                warn!(error = %e, "bootstrap query exhausted retries, treating as signed out");
                None
            }
        };

        // The only place `initializing` flips; it never reverts.
        self.inner.state.send_modify(|state| {
            state.session = session;
            state.initializing = false;
        });
        *done = true;

        self.snapshot()
    }

    /// Overwrite the current session atomically.
    ///
    /// Watchers are notified before this returns, so dependents read
    /// post-update state on their next access. Re-applying an identical
    /// session is harmless.
    pub fn replace(&self, session: Option<Session>) {
        let authenticated = session.is_some();
        self.inner.state.send_modify(|state| {
            state.session = session;
        });
        debug!(authenticated, "session replaced");
    }

    /// A copy of the current state. Synchronous and non-suspending.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes. Each receiver sees every `replace` and
    /// the bootstrap resolution.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
