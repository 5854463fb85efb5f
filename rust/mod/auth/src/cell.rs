//! The live session, its durable copy and its published state.

use std::sync::{Arc, Mutex, RwLock};

use compta_client::{ApiError, TokenSource};
use compta_core::{guard, AppRoute, User};
use compta_flux::StateStore;
use compta_kv::{encode_json, get_json, KVError, KVStore};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::model::{AuthState, Session, TOKEN_KEY, USER_KEY};

/// Single owner of the current session and of the route it allows.
///
/// Mutations are serialized by a writer lock and go storage first, then
/// memory. Publication to the state store happens after the lock is
/// released: each published slice carries a sequence number and is
/// re-published until the store holds the latest value, so concurrent
/// mutations always settle on the live state. Subscribers may call back
/// into the cell.
pub struct SessionCell {
    kv: Arc<dyn KVStore>,
    state: Arc<StateStore>,
    live: RwLock<Live>,
    writer: Mutex<()>,
}

struct Live {
    session: Option<Session>,
    auth: AuthState,
    auth_seq: u64,
    route: AppRoute,
    route_seq: u64,
}

impl Live {
    fn set_auth(&mut self, auth: AuthState) {
        self.auth = auth;
        self.auth_seq += 1;
    }

    fn set_route(&mut self, route: AppRoute) {
        self.route = route;
        self.route_seq += 1;
    }
}

impl SessionCell {
    /// Starts signed out on the login route; call
    /// [`SessionCell::load_persisted`] to look for a stored session.
    pub fn new(kv: Arc<dyn KVStore>, state: Arc<StateStore>) -> Self {
        let cell = Self {
            kv,
            state,
            live: RwLock::new(Live {
                session: None,
                auth: AuthState::signed_out(),
                auth_seq: 0,
                route: AppRoute::login(),
                route_seq: 0,
            }),
            writer: Mutex::new(()),
        };
        cell.publish_auth();
        cell.publish_route();
        cell
    }

    pub fn current(&self) -> Option<Session> {
        self.live.read().unwrap().session.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.live.read().unwrap().session.as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.live.read().unwrap().session.as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.live.read().unwrap().session.is_some()
    }

    pub fn auth_state(&self) -> AuthState {
        self.live.read().unwrap().auth.clone()
    }

    pub fn route(&self) -> AppRoute {
        self.live.read().unwrap().route.clone()
    }

    /// Read the persisted pair. `Ok(None)` when nothing is stored;
    /// `Corrupt` when only one half is present or the user record does not
    /// decode.
    pub fn load_persisted(&self) -> Result<Option<Session>, AuthError> {
        let token = self.kv.get(TOKEN_KEY)?;
        let user = get_json::<User>(self.kv.as_ref(), USER_KEY).map_err(|e| match e {
            KVError::Serialization(msg) => AuthError::Corrupt(msg),
            other => AuthError::Storage(other),
        });
        match (token, user?) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => {
                let token = String::from_utf8(token)
                    .map_err(|e| AuthError::Corrupt(format!("token: {}", e)))?;
                if token.is_empty() {
                    return Err(AuthError::Corrupt("empty token".into()));
                }
                Ok(Some(Session { token, user }))
            }
            (Some(_), None) => Err(AuthError::Corrupt("token without user".into())),
            (None, Some(_)) => Err(AuthError::Corrupt("user without token".into())),
        }
    }

    /// Store a freshly issued session and route to the dashboard.
    ///
    /// On a storage error nothing changes in memory.
    pub fn establish(&self, session: Session) -> Result<(), AuthError> {
        {
            let _w = self.writer.lock().unwrap();
            let user = encode_json(USER_KEY, &session.user)?;
            self.kv.batch_set(&[
                (TOKEN_KEY, session.token.as_bytes()),
                (USER_KEY, user.as_slice()),
            ])?;
            debug!("session persisted for {}", session.user.email);

            let mut live = self.live.write().unwrap();
            live.set_auth(AuthState::authenticated(session.user.clone()));
            live.set_route(AppRoute::dashboard());
            live.session = Some(session);
        }
        self.publish_auth();
        self.publish_route();
        Ok(())
    }

    /// Take a session read back from storage without confirming it.
    pub fn adopt(&self, session: Session) {
        {
            let _w = self.writer.lock().unwrap();
            let mut live = self.live.write().unwrap();
            live.set_auth(AuthState::provisional(session.user.clone()));
            live.session = Some(session);
        }
        self.publish_auth();
    }

    /// The backend accepted `token`. Returns false if the session moved on
    /// in the meantime.
    pub fn confirm(&self, token: &str) -> bool {
        {
            let _w = self.writer.lock().unwrap();
            let mut live = self.live.write().unwrap();
            let user = match live.session.as_ref() {
                Some(s) if s.token == token => s.user.clone(),
                _ => return false,
            };
            live.set_auth(AuthState::authenticated(user));
        }
        self.publish_auth();
        true
    }

    /// Drop the session. Returns true if there was one.
    ///
    /// Storage errors are logged and do not keep the session alive.
    pub fn clear(&self) -> bool {
        let had = {
            let _w = self.writer.lock().unwrap();
            self.clear_locked()
        };
        self.publish_cleared(had)
    }

    /// Drop the session only if `token` is still the live one.
    pub fn clear_if(&self, token: &str) -> bool {
        let had = {
            let _w = self.writer.lock().unwrap();
            let current = matches!(
                self.live.read().unwrap().session.as_ref(),
                Some(s) if s.token == token
            );
            current && self.clear_locked()
        };
        self.publish_cleared(had)
    }

    /// Erase the durable copy without touching memory.
    pub fn erase_persisted(&self) -> Result<(), AuthError> {
        let _w = self.writer.lock().unwrap();
        self.kv.batch_delete(&[TOKEN_KEY, USER_KEY])?;
        Ok(())
    }

    /// Flag an in-flight operation on the published state.
    pub fn set_busy(&self, busy: bool, error: Option<String>) {
        {
            let _w = self.writer.lock().unwrap();
            let mut live = self.live.write().unwrap();
            let mut auth = live.auth.clone();
            auth.busy = busy;
            auth.error = error;
            live.set_auth(auth);
        }
        self.publish_auth();
    }

    /// Go to `path`, or wherever the route guard sends it given the live
    /// session. The check and the route change are one step with respect
    /// to a concurrent logout.
    pub fn navigate(&self, path: &str) -> AppRoute {
        let target = {
            let _w = self.writer.lock().unwrap();
            let mut live = self.live.write().unwrap();
            let target = AppRoute(guard(path, live.session.is_some()).to_string());
            live.set_route(target.clone());
            target
        };
        self.publish_route();
        target
    }

    fn clear_locked(&self) -> bool {
        if let Err(e) = self.kv.batch_delete(&[TOKEN_KEY, USER_KEY]) {
            warn!("failed to erase persisted session: {}", e);
        }
        let mut live = self.live.write().unwrap();
        if live.session.take().is_none() {
            return false;
        }
        info!("session cleared");
        live.set_auth(AuthState::signed_out());
        live.set_route(AppRoute::login());
        true
    }

    fn publish_cleared(&self, had: bool) -> bool {
        if had {
            self.publish_auth();
            self.publish_route();
        }
        had
    }

    fn publish_auth(&self) {
        self.publish(AuthState::PATH, |live| (live.auth.clone(), live.auth_seq));
    }

    fn publish_route(&self) {
        self.publish(AppRoute::PATH, |live| (live.route.clone(), live.route_seq));
    }

    /// Publish a slice of the live state with no lock held. If the slice
    /// changed meanwhile, a stale value may have overwritten the newer
    /// one, so publish again.
    fn publish<T, F>(&self, path: &str, read: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Live) -> (T, u64),
    {
        loop {
            let (value, seq) = read(&*self.live.read().unwrap());
            self.state.set(path, value);
            if read(&*self.live.read().unwrap()).1 == seq {
                break;
            }
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for SessionCell {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(SessionCell::token(self))
    }

    async fn unauthorized(&self, sent: Option<&str>) {
        let Some(token) = sent else { return };
        if self.clear_if(token) {
            warn!("token rejected by the backend, forced logout");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compta_kv::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1, "email": "admin@x.com", "nom": "Admin", "prenom": "Demo"
        }))
        .unwrap()
    }

    fn session(token: &str) -> Session {
        Session {
            token: token.into(),
            user: user(),
        }
    }

    fn cell() -> (SessionCell, Arc<MemoryStore>, Arc<StateStore>) {
        let kv = Arc::new(MemoryStore::new());
        let state = Arc::new(StateStore::new());
        (SessionCell::new(kv.clone(), state.clone()), kv, state)
    }

    #[test]
    fn starts_signed_out() {
        let (cell, _, state) = cell();
        assert!(!cell.is_authenticated());
        assert_eq!(
            state.get_as::<AuthState>(AuthState::PATH),
            Some(AuthState::signed_out())
        );
    }

    #[test]
    fn establish_writes_through() {
        let (cell, kv, state) = cell();
        cell.establish(session("T1")).unwrap();

        assert_eq!(cell.token().as_deref(), Some("T1"));
        assert_eq!(kv.get(TOKEN_KEY).unwrap().unwrap(), b"T1");
        assert!(kv.get(USER_KEY).unwrap().is_some());
        assert!(cell.auth_state().is_authenticated());
        assert_eq!(
            state.get_as::<AppRoute>(AppRoute::PATH),
            Some(AppRoute::dashboard())
        );
        assert_eq!(cell.load_persisted().unwrap(), Some(session("T1")));
    }

    #[test]
    fn clear_erases_and_routes_once() {
        let (cell, kv, state) = cell();
        cell.establish(session("T1")).unwrap();

        let routes = Arc::new(AtomicUsize::new(0));
        let r = routes.clone();
        state.subscribe(AppRoute::PATH, move |_, v| {
            if v.downcast_ref::<AppRoute>() == Some(&AppRoute::login()) {
                r.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(cell.clear());
        assert!(!cell.clear());
        assert!(kv.is_empty());
        assert_eq!(routes.load(Ordering::SeqCst), 1);
        assert_eq!(cell.auth_state(), AuthState::signed_out());
    }

    #[test]
    fn clear_if_ignores_stale_token() {
        let (cell, _, _) = cell();
        cell.establish(session("T2")).unwrap();
        assert!(!cell.clear_if("T1"));
        assert!(cell.is_authenticated());
        assert!(cell.clear_if("T2"));
        assert!(!cell.is_authenticated());
    }

    #[test]
    fn adopt_then_confirm() {
        let (cell, kv, _) = cell();
        cell.adopt(session("T1"));
        assert_eq!(cell.auth_state(), AuthState::provisional(user()));
        assert!(kv.is_empty());

        assert!(!cell.confirm("T0"));
        assert!(cell.confirm("T1"));
        assert_eq!(cell.auth_state(), AuthState::authenticated(user()));
    }

    #[test]
    fn half_pair_is_corrupt() {
        let (cell, kv, _) = cell();
        kv.set(TOKEN_KEY, b"T1").unwrap();
        assert!(matches!(cell.load_persisted(), Err(AuthError::Corrupt(_))));

        kv.delete(TOKEN_KEY).unwrap();
        kv.set(USER_KEY, b"{}").unwrap();
        assert!(matches!(cell.load_persisted(), Err(AuthError::Corrupt(_))));
    }

    #[test]
    fn undecodable_user_is_corrupt() {
        let (cell, kv, _) = cell();
        kv.set(TOKEN_KEY, b"T1").unwrap();
        kv.set(USER_KEY, b"not json").unwrap();
        assert!(matches!(cell.load_persisted(), Err(AuthError::Corrupt(_))));
        cell.erase_persisted().unwrap();
        assert_eq!(cell.load_persisted().unwrap(), None);
    }

    #[test]
    fn busy_flag_keeps_phase() {
        let (cell, _, _) = cell();
        cell.set_busy(true, None);
        assert!(cell.auth_state().busy);
        cell.set_busy(false, Some("nope".into()));
        let state = cell.auth_state();
        assert!(!state.busy);
        assert_eq!(state.error.as_deref(), Some("nope"));
        assert!(!state.is_authenticated());
    }

    #[test]
    fn navigate_follows_live_session() {
        let (cell, _, state) = cell();
        assert_eq!(cell.navigate("/ecritures"), AppRoute::login());

        cell.establish(session("T1")).unwrap();
        assert_eq!(cell.navigate("/ecritures").as_str(), "/ecritures");
        assert_eq!(
            state.get_as::<AppRoute>(AppRoute::PATH),
            Some(AppRoute("/ecritures".into()))
        );
        assert_eq!(cell.navigate("/inconnu"), AppRoute::dashboard());

        cell.clear();
        assert_eq!(cell.route(), AppRoute::login());
        assert_eq!(
            state.get_as::<AppRoute>(AppRoute::PATH),
            Some(AppRoute::login())
        );
    }

    #[test]
    fn subscribers_may_call_back_into_the_cell() {
        let kv = Arc::new(MemoryStore::new());
        let state = Arc::new(StateStore::new());
        let cell = Arc::new(SessionCell::new(kv, state.clone()));

        // bounce anonymous users off protected pages from inside a handler
        let weak = Arc::downgrade(&cell);
        state.subscribe(AuthState::PATH, move |_, v| {
            let signed_out = v.downcast_ref::<AuthState>().map(|s| !s.is_authenticated());
            if let (Some(true), Some(cell)) = (signed_out, weak.upgrade()) {
                assert!(!cell.is_authenticated());
                cell.navigate("/dashboard");
            }
        });

        cell.establish(session("T1")).unwrap();
        assert!(cell.clear());
        assert_eq!(cell.route(), AppRoute::login());
        assert_eq!(
            state.get_as::<AppRoute>(AppRoute::PATH),
            Some(AppRoute::login())
        );
    }

    #[tokio::test]
    async fn unauthorized_hook_clears_live_token_only() {
        let (cell, _, _) = cell();
        cell.establish(session("T1")).unwrap();

        cell.unauthorized(None).await;
        cell.unauthorized(Some("T0")).await;
        assert!(cell.is_authenticated());

        cell.unauthorized(Some("T1")).await;
        assert!(!cell.is_authenticated());
    }
}
