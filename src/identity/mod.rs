//! Abstract contract for the identity collaborator.
//!
//! The shell depends only on this trait; the real remote provider and the
//! in-memory test provider both live behind it, so the whole session core
//! can be exercised without a network.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::IdentityError;
use crate::session::Session;

/// Callback invoked on every session-change notification. `None` means the
/// session ended (remote sign-out, expiry); `Some` carries the new or
/// refreshed session.
pub type SessionCallback = Arc<dyn Fn(Option<Session>) + Send + Sync>;

/// Response to a sign-up request. A present session means the account is
/// authenticated immediately; an absent one means confirmation is pending.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    /// Session issued on immediate authentication
    pub session: Option<Session>,
}

/// Handle to a registered session-change subscription.
///
/// Dropping the handle releases the registration, so teardown paths that
/// never call `unsubscribe` explicitly (including error paths) still clean
/// up.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancellation closure
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Release the registration explicitly
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// The identity collaborator: issues, refreshes, and revokes sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Query any pre-existing session (the bootstrap question). Both a
    /// present and an absent session are success outcomes.
    async fn current_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Register a callback for out-of-band session changes (token refresh,
    /// remote sign-out, signed in elsewhere).
    fn on_session_change(&self, callback: SessionCallback)
        -> Result<Subscription, IdentityError>;

    /// Authenticate with email and password
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// Register a new account
    async fn sign_up(&self, email: &str, password: &str)
        -> Result<SignUpResponse, IdentityError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), IdentityError>;
}
