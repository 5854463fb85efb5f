use compta_core::User;
use serde::{Deserialize, Serialize};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const ME_PATH: &str = "/api/v1/auth/me";

/// Durable storage keys.
pub const TOKEN_KEY: &str = "session:token";
pub const USER_KEY: &str = "session:user";

/// Body of `POST /api/v1/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    #[serde(rename = "mot_de_passe")]
    pub password: &'a str,
}

/// `data` of a successful login envelope.
#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub utilisateur: User,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A live session. Token and user exist together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Authentication state. The UI reads this to decide what to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub phase: AuthPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthPhase {
    Unauthenticated,
    /// Restored from storage, token not yet confirmed by the backend.
    Provisional,
    Authenticated,
}

impl AuthState {
    pub const PATH: &'static str = "auth/state";

    pub fn signed_out() -> Self {
        Self {
            phase: AuthPhase::Unauthenticated,
            user: None,
            busy: false,
            error: None,
        }
    }

    pub fn provisional(user: User) -> Self {
        Self {
            phase: AuthPhase::Provisional,
            user: Some(user),
            busy: true,
            error: None,
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            phase: AuthPhase::Authenticated,
            user: Some(user),
            busy: false,
            error: None,
        }
    }

    /// Token and user are both held; true while provisional too.
    pub fn is_authenticated(&self) -> bool {
        self.phase != AuthPhase::Unauthenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            name: "Admin".into(),
            surname: "Demo".into(),
            email: "admin@x.com".into(),
            role: "admin".into(),
            entity_id: None,
            permissions: vec![],
        }
    }

    #[test]
    fn login_request_wire_names() {
        let body = serde_json::to_value(LoginRequest {
            email: "admin@x.com",
            password: "demo123",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"email": "admin@x.com", "mot_de_passe": "demo123"}));
    }

    #[test]
    fn login_data_decodes() {
        let data: LoginData = serde_json::from_value(serde_json::json!({
            "token": "T1",
            "utilisateur": {"id": 1, "email": "admin@x.com", "nom": "Admin"},
            "expires_in": 86400
        }))
        .unwrap();
        assert_eq!(data.token, "T1");
        assert_eq!(data.utilisateur.name, "Admin");
        assert_eq!(data.expires_in, Some(86400));
    }

    #[test]
    fn phases() {
        assert!(!AuthState::signed_out().is_authenticated());
        assert!(AuthState::provisional(user()).is_authenticated());
        assert!(AuthState::provisional(user()).busy);
        assert!(AuthState::authenticated(user()).is_authenticated());
    }

    #[test]
    fn state_serializes_camel_case() {
        let json = serde_json::to_value(AuthState::signed_out()).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "unauthenticated", "busy": false}));
    }
}
