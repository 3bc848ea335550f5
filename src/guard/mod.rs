//! Route guard: decides whether a protected navigation renders, waits, or
//! redirects, driven purely by session store snapshots.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::session::{SessionState, SessionStore};

/// Per-evaluation outcome for a protected navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardDecision {
    /// The bootstrap window has not resolved; render a placeholder, make no
    /// redirect decision yet
    Loading,
    /// No authenticated principal; redirect to the given route
    Redirect(String),
    /// Render the protected content
    Admit,
}

/// Gate in front of protected views. Holds no private state; every decision
/// is a pure function of the current store snapshot, so it never goes stale.
pub struct RouteGuard {
    store: SessionStore,
    sign_in_route: String,
}

impl RouteGuard {
    /// Create a guard redirecting unauthenticated traffic to `sign_in_route`
    pub fn new(store: SessionStore, sign_in_route: impl Into<String>) -> Self {
        Self {
            store,
            sign_in_route: sign_in_route.into(),
        }
    }

    /// Evaluate the guard against the current snapshot
    pub fn evaluate(&self) -> GuardDecision {
        Self::decide(&self.store.snapshot(), &self.sign_in_route)
    }

    /// Reactive handle that re-evaluates on every store change
    pub fn watch(&self) -> GuardWatcher {
        GuardWatcher {
            state: self.store.subscribe(),
            sign_in_route: self.sign_in_route.clone(),
        }
    }

    fn decide(state: &SessionState, sign_in_route: &str) -> GuardDecision {
        if state.initializing {
            return GuardDecision::Loading;
        }
        match state.principal() {
            Some(_) => GuardDecision::Admit,
            None => GuardDecision::Redirect(sign_in_route.to_string()),
        }
    }
}

/// Reactive view of the guard for the lifetime of one navigation.
pub struct GuardWatcher {
    state: watch::Receiver<SessionState>,
    sign_in_route: String,
}

impl GuardWatcher {
    /// Decision for the latest observed state
    pub fn decision(&self) -> GuardDecision {
        RouteGuard::decide(&self.state.borrow(), &self.sign_in_route)
    }

    /// Wait for the next store change and return the re-evaluated decision.
    /// A closed channel means the shell is gone; the last known decision is
    /// returned and the caller's navigation ends with it.
    pub async fn changed(&mut self) -> GuardDecision {
        let _ = self.state.changed().await;
        self.decision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::memory::InMemoryIdentity;
    use crate::identity::IdentityProvider;
    use crate::session::{Principal, Session};
    use std::sync::Arc;

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

    #[test]
    fn state_table() {
        // initializing=true -> Loading regardless of principal
        let loading = SessionState {
            session: Some(session_for("a@b.com")),
            initializing: true,
        };
        assert_eq!(
            RouteGuard::decide(&loading, "/auth"),
            GuardDecision::Loading
        );

        // resolved + absent principal -> Redirect
        let denied = SessionState::resolved(None);
        assert_eq!(
            RouteGuard::decide(&denied, "/auth"),
            GuardDecision::Redirect("/auth".to_string())
        );

        // resolved + present principal -> Admit
        let admitted = SessionState::resolved(Some(session_for("a@b.com")));
        assert_eq!(RouteGuard::decide(&admitted, "/auth"), GuardDecision::Admit);
    }

    #[tokio::test]
    async fn loading_then_denied_when_bootstrap_finds_no_session() {
        let provider: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentity::new());
        let store = SessionStore::new();
        let guard = RouteGuard::new(store.clone(), "/auth");
        let mut watcher = guard.watch();

        assert_eq!(watcher.decision(), GuardDecision::Loading);

        store.initialize(&provider, 1).await;
        assert_eq!(
            watcher.changed().await,
            GuardDecision::Redirect("/auth".to_string())
        );
    }

    #[tokio::test]
    async fn admitted_to_denied_when_session_ends() {
        let identity = Arc::new(InMemoryIdentity::new());
        identity.emit(Some(session_for("a@b.com"))).await;
        let provider: Arc<dyn IdentityProvider> = identity;

        let store = SessionStore::new();
        store.initialize(&provider, 1).await;

        let guard = RouteGuard::new(store.clone(), "/auth");
        let mut watcher = guard.watch();
        assert_eq!(watcher.decision(), GuardDecision::Admit);
        assert_eq!(guard.evaluate(), GuardDecision::Admit);

        store.replace(None);
        assert_eq!(
            watcher.changed().await,
            GuardDecision::Redirect("/auth".to_string())
        );
    }
}
