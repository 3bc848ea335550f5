//! Headless client application shell.
//!
//! Authenticates against a remote identity provider and gates access to
//! authenticated capabilities. The session lifecycle core (store, change
//! listener, credential operations, request decorator) and the route guard
//! live here; rendering is someone else's problem.

pub mod common;
pub mod error;
pub mod guard;
pub mod identity;
pub mod resources;
pub mod session;

pub use error::{CredentialError, IdentityError, ResourceError};
pub use guard::{GuardDecision, GuardWatcher, RouteGuard};
pub use identity::{IdentityProvider, SessionCallback, SignUpResponse, Subscription};
pub use resources::{AuthHeaderDecorator, ListQuery, ResourceClient};
pub use session::{
    CredentialOperations, Principal, Session, SessionChangeListener, SessionState, SessionStore,
    SignUpOutcome,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Default route unauthenticated traffic is redirected to
pub const DEFAULT_SIGN_IN_ROUTE: &str = "/auth";
/// Default number of bootstrap query attempts before degrading to signed-out
pub const DEFAULT_BOOTSTRAP_ATTEMPTS: usize = 3;

/// Configuration for the application shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Route the guard redirects unauthenticated traffic to
    pub sign_in_route: String,
    /// Base URL of the domain-record API, when the resource layer is used
    pub api_base_url: Option<String>,
    /// Bootstrap query attempts before treating the user as signed out
    pub bootstrap_attempts: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.to_string(),
            api_base_url: None,
            bootstrap_attempts: DEFAULT_BOOTSTRAP_ATTEMPTS,
        }
    }
}

/// The assembled shell: one per application instance.
///
/// Owns the session store and wires the listener and credential operations
/// to an injected identity provider. All session mutation funnels through
/// the store; views only ever consume snapshots, guard decisions, and
/// decorated headers.
pub struct AppShell {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
    listener: SessionChangeListener,
    credentials: CredentialOperations,
    config: ShellConfig,
}

impl AppShell {
    /// Assemble a shell with default configuration
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_config(provider, ShellConfig::default())
    }

    /// Assemble a shell with explicit configuration
    pub fn with_config(provider: Arc<dyn IdentityProvider>, config: ShellConfig) -> Self {
        let store = SessionStore::new();
        let listener = SessionChangeListener::new(Arc::clone(&provider), store.clone());
        let credentials = CredentialOperations::new(Arc::clone(&provider), store.clone());

        Self {
            provider,
            store,
            listener,
            credentials,
            config,
        }
    }

    /// Resolve any pre-existing session and subscribe for changes.
    ///
    /// Runs the bootstrap exactly once; a failed change subscription is
    /// non-fatal. Returns the resolved state.
    pub async fn initialize(&self) -> SessionState {
        info!("initializing application shell");
        let state = self
            .store
            .initialize(&self.provider, self.config.bootstrap_attempts)
            .await;
        self.listener.start().await;
        state
    }

    /// Release the change subscription. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.listener.stop().await;
        info!("application shell shut down");
    }

    /// The session store (read-only consumers should prefer `snapshot`)
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Sign-in / sign-up / sign-out operations
    pub fn credentials(&self) -> &CredentialOperations {
        &self.credentials
    }

    /// A guard for protected navigation, bound to the configured sign-in
    /// route
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.store.clone(), self.config.sign_in_route.clone())
    }

    /// A decorator attaching the bearer credential to outgoing requests
    pub fn decorator(&self) -> AuthHeaderDecorator {
        AuthHeaderDecorator::new(self.store.clone())
    }

    /// Shell configuration
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }
}
