//! In-process identity provider for tests and the demo binary.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::IdentityError;
use crate::identity::{IdentityProvider, SessionCallback, SignUpResponse, Subscription};
use crate::session::{Principal, Session};

struct StoredUser {
    id: String,
    password: String,
    confirmed: bool,
}

/// An identity provider backed entirely by process memory.
///
/// Behaves like a hosted provider from the shell's point of view: password
/// sign-in, sign-up with optional email-confirmation mode, and change
/// fan-out to subscribers. The rejection messages match the hosted service
/// the shell is written against, so message-passthrough tests are realistic.
pub struct InMemoryIdentity {
    users: DashMap<String, StoredUser>,
    current: RwLock<Option<Session>>,
    subscribers: Arc<DashMap<Uuid, SessionCallback>>,
    confirm_on_sign_up: bool,
}

impl InMemoryIdentity {
    /// Provider that authenticates sign-ups immediately
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            current: RwLock::new(None),
            subscribers: Arc::new(DashMap::new()),
            confirm_on_sign_up: false,
        }
    }

    /// Provider that leaves new accounts pending until confirmed
    pub fn with_confirmation_required() -> Self {
        Self {
            confirm_on_sign_up: true,
            ..Self::new()
        }
    }

    /// Register a confirmed account without going through sign-up
    pub fn seed_user(&self, email: impl Into<String>, password: impl Into<String>) {
        self.users.insert(
            email.into(),
            StoredUser {
                id: Uuid::new_v4().to_string(),
                password: password.into(),
                confirmed: true,
            },
        );
    }

    /// Mark an account as confirmed
    pub fn confirm_user(&self, email: &str) {
        if let Some(mut user) = self.users.get_mut(email) {
            user.confirmed = true;
        }
    }

    /// Replace the current session out-of-band and notify subscribers, the
    /// way a remote refresh or a sign-out from another device would.
    pub async fn emit(&self, session: Option<Session>) {
        *self.current.write().await = session.clone();
        self.notify(session);
    }

    fn notify(&self, session: Option<Session>) {
        for entry in self.subscribers.iter() {
            (entry.value())(session.clone());
        }
        debug!(
            subscribers = self.subscribers.len(),
            authenticated = self.current.try_read().map_or(false, |s| s.is_some()),
            "session change delivered"
        );
    }

    fn issue_session(&self, email: &str, user_id: &str) -> Session {
        Session::new(
            format!("tok-{}", Uuid::new_v4()),
            Some(Utc::now() + Duration::hours(1)),
            Principal {
                id: user_id.to_string(),
                email: email.to_string(),
            },
        )
    }
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        Ok(self.current.read().await.clone())
    }

    fn on_session_change(
        &self,
        callback: SessionCallback,
    ) -> Result<Subscription, IdentityError> {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, callback);

        let subscribers = Arc::clone(&self.subscribers);
        Ok(Subscription::new(move || {
            subscribers.remove(&id);
        }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let session = {
            let user = self
                .users
                .get(email)
                .ok_or_else(|| IdentityError::rejected("Invalid login credentials"))?;
            if user.password != password {
                return Err(IdentityError::rejected("Invalid login credentials"));
            }
            if !user.confirmed {
                return Err(IdentityError::rejected("Email not confirmed"));
            }
            self.issue_session(email, &user.id)
        };

        *self.current.write().await = Some(session.clone());
        self.notify(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpResponse, IdentityError> {
        if self.users.contains_key(email) {
            return Err(IdentityError::rejected("User already registered"));
        }

        let user_id = Uuid::new_v4().to_string();
        self.users.insert(
            email.to_string(),
            StoredUser {
                id: user_id.clone(),
                password: password.to_string(),
                confirmed: !self.confirm_on_sign_up,
            },
        );

        if self.confirm_on_sign_up {
            return Ok(SignUpResponse { session: None });
        }

        let session = self.issue_session(email, &user_id);
        *self.current.write().await = Some(session.clone());
        self.notify(Some(session.clone()));
        Ok(SignUpResponse {
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *self.current.write().await = None;
        self.notify(None);
        Ok(())
    }
}
