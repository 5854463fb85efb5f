use std::sync::Arc;

use compta_auth::{AuthState, RestoreOutcome, SessionCell, SessionStore};
use compta_client::{ApiClient, ApiError, ApiResult};
use compta_core::{AppRoute, ClientConfig};
use compta_flux::StateStore;
use compta_kv::{KVStore, RedbStore};
use compta_notify::NotificationQueue;
use tracing::info;

use crate::error::AppError;

pub struct App {
    config: ClientConfig,
    state: Arc<StateStore>,
    api: Arc<ApiClient>,
    session: SessionStore,
    notifications: NotificationQueue,
}

impl App {
    /// Open the session database from `config` and wire everything.
    pub fn start(config: ClientConfig) -> Result<Self, AppError> {
        let db_path = config.resolve_db_path();
        let kv = RedbStore::open(&db_path)?;
        info!("session storage at {}", db_path.display());
        Self::with_store(config, Arc::new(kv))
    }

    /// Wire everything on top of an existing key-value store.
    pub fn with_store(config: ClientConfig, kv: Arc<dyn KVStore>) -> Result<Self, AppError> {
        let state = Arc::new(StateStore::new());
        let cell = Arc::new(SessionCell::new(kv, state.clone()));
        let api = Arc::new(ApiClient::from_config(&config, cell.clone())?);
        let session = SessionStore::new(cell, api.clone());
        let notifications = NotificationQueue::with_state(state.clone());

        Ok(Self {
            config,
            state,
            api,
            session,
            notifications,
        })
    }

    /// Restore a persisted session, then settle the route.
    pub async fn boot(&self) -> RestoreOutcome {
        let outcome = self.session.restore().await;
        info!("boot: {:?}", outcome);
        let current = self.route();
        self.navigate(current.as_str());
        outcome
    }

    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.session.try_login(email, password).await {
            Ok(user) => {
                self.notifications
                    .show_success(format!("Bienvenue, {}", user.full_name()));
                true
            }
            Err(e) => {
                self.notifications.show_error(e.user_message());
                false
            }
        }
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// Unwrap an API result, turning an error into a notification.
    ///
    /// A 401 has already signed the user out by the time it gets here and
    /// is shown as a warning.
    pub fn report<T>(&self, result: ApiResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e @ ApiError::Unauthorized(_)) => {
                self.notifications.show_warning(e.user_message());
                None
            }
            Err(e) => {
                self.notifications.show_error(e.user_message());
                None
            }
        }
    }

    /// Go to `path`, or wherever the route guard sends it.
    pub fn navigate(&self, path: &str) -> AppRoute {
        self.session.cell().navigate(path)
    }

    pub fn route(&self) -> AppRoute {
        self.session.cell().route()
    }

    pub fn auth_state(&self) -> AuthState {
        self.session.state()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    /// Cancel pending notification timers and release every store.
    pub fn shutdown(self) {
        self.notifications.shutdown();
        info!("client runtime shut down");
    }
}
