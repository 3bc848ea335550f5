use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CredentialError;
use crate::identity::IdentityProvider;
use crate::session::store::SessionStore;

/// Outcome of a successful sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignUpOutcome {
    /// The provider authenticated the new account immediately
    SignedIn,
    /// The account was created but needs confirmation (e.g. by email)
    /// before it can authenticate
    ConfirmationPending,
}

/// Sign-in, sign-up, and sign-out against the identity provider, folding
/// results into the session store.
///
/// Provider notification ordering is not trusted: each operation applies its
/// own `replace` on success, so a caller that reads the store right after a
/// resolved operation never sees stale state. The listener re-applying an
/// identical session afterwards is harmless.
pub struct CredentialOperations {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
}

impl CredentialOperations {
    /// Create the operations surface for a provider and store
    pub fn new(provider: Arc<dyn IdentityProvider>, store: SessionStore) -> Self {
        Self { provider, store }
    }

    /// Sign in with email and password. On success the store holds the new
    /// session before this future resolves.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), CredentialError> {
        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                self.store.replace(Some(session));
                info!(email = %email, "sign-in succeeded");
                Ok(())
            }
            Err(e) => {
                warn!(email = %email, error = %e, "sign-in failed");
                Err(e.into())
            }
        }
    }

    /// Register a new account. Depending on the provider's configuration the
    /// account is either authenticated immediately or left pending
    /// confirmation; the two outcomes are distinguishable from each other and
    /// from a hard error.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, CredentialError> {
        let response = self
            .provider
            .sign_up(email, password)
            .await
            .map_err(|e| {
                warn!(email = %email, error = %e, "sign-up failed");
                CredentialError::from(e)
            })?;

        match response.session {
            Some(session) => {
                self.store.replace(Some(session));
                info!(email = %email, "sign-up succeeded, authenticated");
                Ok(SignUpOutcome::SignedIn)
            }
            None => {
                info!(email = %email, "sign-up succeeded, confirmation pending");
                Ok(SignUpOutcome::ConfirmationPending)
            }
        }
    }

    /// Sign out. The store reads signed-out before this future resolves; the
    /// local session is dropped even if the provider call fails.
    pub async fn sign_out(&self) -> Result<(), CredentialError> {
        let result = self.provider.sign_out().await;
        self.store.replace(None);

        match result {
            Ok(()) => {
                info!("signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "provider sign-out failed, local session dropped");
                Err(e.into())
            }
        }
    }
}
