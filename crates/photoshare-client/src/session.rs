//! Identity session provider.
//!
//! Tracks where this client stands in the sign-up/sign-in flow:
//!
//! ```text
//! Anonymous -> PendingConfirmation -> Anonymous (confirmed) -> Authenticated -> Anonymous
//! ```
//!
//! The held session is re-validated against the identity service on every
//! [`SessionProvider::current_session`] call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use photoshare_shared::{
    ApiError, ApiResult, Backend, IdentityService, Session, SessionToken, SignUpOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    /// Signed up, waiting for the emailed code.
    PendingConfirmation { email: String },
    Authenticated(Session),
}

pub struct SessionProvider {
    identity: Arc<dyn IdentityService>,
    state: SessionState,
}

impl SessionProvider {
    pub fn new(backend: &Backend) -> Self {
        Self {
            identity: backend.identity.clone(),
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Adopt a previously issued token if the identity service still honours it.
    pub async fn restore(&mut self, token: &SessionToken) -> ApiResult<Option<Session>> {
        match self.identity.resolve_session(token).await? {
            Some(session) => {
                debug!(user_id = %session.user_id, "Session restored");
                self.state = SessionState::Authenticated(session.clone());
                Ok(Some(session))
            }
            None => {
                debug!("Stored session is no longer valid");
                self.state = SessionState::Anonymous;
                Ok(None)
            }
        }
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> ApiResult<SignUpOutcome> {
        let outcome = self.identity.sign_up(email, password).await?;
        info!(destination = %outcome.destination, "Confirmation code sent");
        self.state = SessionState::PendingConfirmation {
            email: email.trim().to_string(),
        };
        Ok(outcome)
    }

    pub async fn confirm_sign_up(&mut self, email: &str, code: &str) -> ApiResult<()> {
        self.identity.confirm_sign_up(email, code).await?;
        if matches!(self.state, SessionState::PendingConfirmation { .. }) {
            self.state = SessionState::Anonymous;
        }
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> ApiResult<Session> {
        match self.identity.sign_in(email, password).await {
            Ok(session) => {
                self.state = SessionState::Authenticated(session.clone());
                Ok(session)
            }
            Err(e @ ApiError::Unconfirmed(_)) => {
                self.state = SessionState::PendingConfirmation {
                    email: email.trim().to_string(),
                };
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Revoke the held session.  The provider is anonymous afterwards even
    /// when revocation fails.
    pub async fn sign_out(&mut self) -> ApiResult<()> {
        let previous = std::mem::replace(&mut self.state, SessionState::Anonymous);
        if let SessionState::Authenticated(session) = previous {
            if let Err(e) = self.identity.sign_out(&session.token).await {
                warn!(error = %e, "Failed to revoke session");
                return Err(e);
            }
            info!(user_id = %session.user_id, "Signed out");
        }
        Ok(())
    }

    /// The held session if the identity service still considers it valid.
    pub async fn current_session(&mut self) -> ApiResult<Option<Session>> {
        let SessionState::Authenticated(held) = &self.state else {
            return Ok(None);
        };
        if held.is_expired() {
            debug!("Held session expired");
            self.state = SessionState::Anonymous;
            return Ok(None);
        }

        let token = held.token.clone();
        match self.identity.resolve_session(&token).await? {
            Some(session) => {
                self.state = SessionState::Authenticated(session.clone());
                Ok(Some(session))
            }
            None => {
                self.state = SessionState::Anonymous;
                Ok(None)
            }
        }
    }
}
