use compta_client::ApiError;
use compta_kv::KVError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend refused the email/password pair.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("session storage: {0}")]
    Storage(#[from] KVError),

    /// Persisted session exists but cannot be used.
    #[error("corrupt persisted session: {0}")]
    Corrupt(String),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(_) => "Email ou mot de passe incorrect".to_string(),
            AuthError::Api(e) => e.user_message(),
            AuthError::Storage(_) => "Impossible d'enregistrer la session".to_string(),
            AuthError::Corrupt(_) => "Session locale illisible".to_string(),
        }
    }
}
