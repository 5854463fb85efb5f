use crate::error::ApiError;

/// Pluggable token provider. Consulted before every authenticated request
/// and told when the backend rejects the token it handed out.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    /// Token to attach, or `Ok(None)` to send the request anonymously.
    async fn token(&self) -> Result<Option<String>, ApiError>;

    /// The backend answered 401 to a request sent with `sent` as bearer.
    /// Runs before the error is returned to the caller.
    async fn unauthorized(&self, _sent: Option<&str>) {}
}

/// No authentication, anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Static bearer token (already obtained externally).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}
