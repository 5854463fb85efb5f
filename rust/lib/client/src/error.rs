/// Coarse classification of an [`ApiError`], for callers that branch on the
/// kind of failure rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never got a response (DNS, refused, timeout).
    Network,
    /// HTTP 401: the token is missing, expired or revoked.
    Unauthorized,
    /// The backend answered `success: false`.
    Rejected,
    /// Any other non-2xx status.
    Server,
    /// The body was not what the endpoint promised.
    Decode,
}

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("decode: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::Rejected(_) => ErrorKind::Rejected,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Message suitable for an error toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Impossible de joindre le serveur".to_string(),
            ApiError::Unauthorized(_) => {
                "Votre session a expiré, veuillez vous reconnecter".to_string()
            }
            ApiError::Rejected(message) => message.clone(),
            ApiError::Server { status, message } if message.is_empty() => {
                format!("Erreur serveur ({})", status)
            }
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Decode(_) => "Réponse inattendue du serveur".to_string(),
        }
    }
}
