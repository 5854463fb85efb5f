use std::sync::Arc;

use compta_client::{ApiClient, ApiError};
use compta_core::User;
use tracing::{debug, info, warn};

use crate::cell::SessionCell;
use crate::error::AuthError;
use crate::model::{AuthState, LoginData, LoginRequest, Session, LOGIN_PATH, ME_PATH};

/// What [`SessionStore::restore`] found at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// Nothing persisted.
    Anonymous,
    /// Signed in after startup: the persisted session was confirmed, or a
    /// login during the check replaced it. Carries the live user.
    Restored(User),
    /// Persisted session rejected, unreadable or unverifiable; now signed out.
    Invalidated,
}

/// Login, logout and startup restore against the backend.
pub struct SessionStore {
    cell: Arc<SessionCell>,
    api: Arc<ApiClient>,
}

impl SessionStore {
    /// `api` must use `cell` as its token source for 401s to sign out.
    pub fn new(cell: Arc<SessionCell>, api: Arc<ApiClient>) -> Self {
        Self { cell, api }
    }

    pub fn cell(&self) -> &Arc<SessionCell> {
        &self.cell
    }

    /// Boolean form of [`SessionStore::try_login`]; the failure reason is
    /// left on the published state.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        self.try_login(email, password).await.is_ok()
    }

    pub async fn try_login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.cell.set_busy(true, None);
        match self.authenticate(email, password).await {
            Ok(user) => {
                info!("logged in as {}", user.email);
                Ok(user)
            }
            Err(e) => {
                warn!("login failed for {}: {}", email, e);
                self.cell.set_busy(false, Some(e.user_message()));
                Err(e)
            }
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let body = LoginRequest { email, password };
        let data: LoginData = self
            .api
            .post_anonymous(LOGIN_PATH, &body)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized(msg) | ApiError::Rejected(msg) => {
                    AuthError::InvalidCredentials(msg)
                }
                other => AuthError::Api(other),
            })?;
        if data.token.is_empty() {
            return Err(ApiError::Decode("login response without token".into()).into());
        }
        let user = data.utilisateur.clone();
        self.cell.establish(Session {
            token: data.token,
            user: data.utilisateur,
        })?;
        Ok(user)
    }

    /// Sign out locally. Safe to call when already signed out.
    pub fn logout(&self) {
        if self.cell.clear() {
            info!("logged out");
        }
    }

    /// Pick up a persisted session and confirm it with the backend.
    ///
    /// Any failure of the check signs out; a half-present or unreadable
    /// persisted pair is erased.
    pub async fn restore(&self) -> RestoreOutcome {
        let session = match self.cell.load_persisted() {
            Ok(Some(session)) => session,
            Ok(None) => return RestoreOutcome::Anonymous,
            Err(e) => {
                warn!("discarding persisted session: {}", e);
                if let Err(e) = self.cell.erase_persisted() {
                    warn!("failed to erase persisted session: {}", e);
                }
                return RestoreOutcome::Invalidated;
            }
        };

        let token = session.token.clone();
        let user = session.user.clone();
        self.cell.adopt(session);

        match self.api.get::<serde_json::Value>(ME_PATH).await {
            Ok(_) if self.cell.confirm(&token) => {
                info!("session restored for {}", user.email);
                RestoreOutcome::Restored(user)
            }
            Ok(_) => self.superseded(),
            Err(e) => {
                warn!("persisted session rejected: {}", e);
                self.cell.clear_if(&token);
                self.superseded()
            }
        }
    }

    /// The restored session is gone; a login may have replaced it while it
    /// was being checked.
    fn superseded(&self) -> RestoreOutcome {
        match self.cell.user() {
            Some(current) => {
                debug!("restored session superseded by {}", current.email);
                RestoreOutcome::Restored(current)
            }
            None => RestoreOutcome::Invalidated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.cell.is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.cell.user()
    }

    pub fn token(&self) -> Option<String> {
        self.cell.token()
    }

    pub fn state(&self) -> AuthState {
        self.cell.auth_state()
    }
}
