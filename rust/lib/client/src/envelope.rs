use serde::Deserialize;

use crate::error::ApiError;

/// Response body shared by every backend endpoint:
///
/// ```json
/// {"success": true, "data": {...}, "message": "..."}
/// {"success": false, "error": "...", "message": "..."}
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Turn the envelope into the payload or a tagged error.
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::Decode("response envelope has no data".into())),
            (false, _) => Err(ApiError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "request rejected".to_string()),
            )),
        }
    }

    /// Like `into_result`, for endpoints whose payload the caller ignores.
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            self.into_result().map(|_| ())
        }
    }

    /// Best human-readable reason carried by the envelope, if any.
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}
