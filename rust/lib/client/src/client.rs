use std::sync::Arc;
use std::time::Duration;

use compta_core::ClientConfig;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::token::TokenSource;

/// Shared HTTP client for the REST backend.
///
/// Paths are relative to the base URL (`/api/v1/...`). Bodies go out as
/// JSON; responses are unwrapped from their [`Envelope`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, token_source)
    }

    /// Build a client for `config.api_url` with the configured timeout.
    pub fn from_config(
        config: &ClientConfig,
        token_source: Arc<dyn TokenSource>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_http(http, config.api_base(), token_source))
    }

    fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_source,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ── Verbs ───────────────────────────────────────────────────────

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> ApiResult<R> {
        let resp = self.send(self.http.get(self.url(path))).await?;
        Self::parse(resp).await
    }

    pub async fn get_query<R, Q>(&self, path: &str, query: &Q) -> ApiResult<R>
    where
        R: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self.send(self.http.get(self.url(path)).query(query)).await?;
        Self::parse(resp).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self.send(self.http.post(self.url(path)).json(body)).await?;
        Self::parse(resp).await
    }

    pub async fn put<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self.send(self.http.put(self.url(path)).json(body)).await?;
        Self::parse(resp).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> ApiResult<R> {
        let resp = self.send(self.http.delete(self.url(path))).await?;
        Self::parse(resp).await
    }

    /// POST where only the `success` flag matters.
    pub async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let resp = self.send(self.http.post(self.url(path)).json(body)).await?;
        Self::parse_envelope::<serde_json::Value>(resp).await?.into_ack()
    }

    /// POST without a bearer token. A 401 here is a plain error and never
    /// reaches the token source.
    pub async fn post_anonymous<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {} (anonymous)", url);
        let resp = self.http.post(&url).json(body).send().await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(Self::error_message(resp).await));
        }
        Self::parse(resp).await
    }

    // ── Plumbing ────────────────────────────────────────────────────

    /// Attach the bearer token, send, and run the 401 hook.
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let token = self.token_source.token().await?;
        let builder = match &token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        };

        let resp = builder.send().await?;
        debug!("{} -> {}", resp.url(), resp.status());

        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!("backend rejected credentials for {}", resp.url().path());
            self.token_source.unauthorized(token.as_deref()).await;
            return Err(ApiError::Unauthorized(Self::error_message(resp).await));
        }
        Ok(resp)
    }

    async fn parse<R: DeserializeOwned>(resp: Response) -> ApiResult<R> {
        Self::parse_envelope::<R>(resp).await?.into_result()
    }

    async fn parse_envelope<R: DeserializeOwned>(resp: Response) -> ApiResult<Envelope<R>> {
        let status = resp.status();
        if !status.is_success() {
            let message = Self::error_message(resp).await;
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    /// Pull a reason out of an error response: the envelope's `error` or
    /// `message` when present, the raw body otherwise.
    async fn error_message(resp: Response) -> String {
        let body = resp.text().await.unwrap_or_default();
        serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|env| env.reason().map(str::to_string))
            .unwrap_or(body)
    }
}
