//! Session lifecycle core: the store holding the current session, the
//! listener bridging provider notifications into it, and the credential
//! operations that mutate it.

pub mod listener;
pub mod ops;
pub mod store;

pub use listener::SessionChangeListener;
pub use ops::{CredentialOperations, SignUpOutcome};
pub use store::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user derived from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier assigned by the identity provider
    pub id: String,
    /// Email / display field
    pub email: String,
}

/// Opaque identity-provider artifact proving an authenticated identity.
///
/// The shell stores, reads, and forwards the bearer credential; it never
/// parses or mutates it. Expiry semantics are owned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer credential attached to outgoing resource requests
    pub access_token: String,
    /// When the credential expires, if the provider reports it
    pub expires_at: Option<DateTime<Utc>>,
    /// The user this session belongs to
    pub principal: Principal,
}

impl Session {
    /// Create a new session artifact
    pub fn new(
        access_token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        principal: Principal,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            principal,
        }
    }

    /// Check if the session is expired. Unknown expiry counts as valid; the
    /// provider is the authority and will notify on expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |exp| exp <= Utc::now())
    }
}

/// The session state the rest of the application observes.
///
/// The principal is derived from the session rather than stored next to it,
/// so a session/principal mismatch cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current session, if any
    pub session: Option<Session>,
    /// True from process start until the first session resolution completes.
    /// Flips to false exactly once per shell instance and never reverts.
    pub initializing: bool,
}

impl SessionState {
    /// State at process start, before the bootstrap query has resolved
    pub fn bootstrap() -> Self {
        Self {
            session: None,
            initializing: true,
        }
    }

    /// State after the bootstrap query resolved (session present or absent
    /// are both success outcomes)
    pub fn resolved(session: Option<Session>) -> Self {
        Self {
            session,
            initializing: false,
        }
    }

    /// The principal of the current session, if one exists
    pub fn principal(&self) -> Option<&Principal> {
        self.session.as_ref().map(|s| &s.principal)
    }

    /// Whether a session is currently established
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::bootstrap()
    }
}
