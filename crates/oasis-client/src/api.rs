//! REST boundary.
//!
//! [`RestClient`] is the seam view models depend on; [`HttpClient`] is the
//! reqwest implementation used by the app.  Authentication is a bearer
//! token from [`ClientConfig`].

use std::future::Future;

use oasis_shared::protocol::server_message;
use oasis_shared::Envelope;
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, SyncError};
use crate::requests::{HttpMethod, Request};

pub trait RestClient: Send + Sync {
    /// Issue one request and parse the response envelope.
    fn send(&self, request: &Request) -> impl Future<Output = Result<Envelope, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, SyncError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| SyncError::InvalidInput(format!("Invalid API URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidInput(format!(
                "API URL cannot carry a path: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::InvalidInput(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token: config.api_token.clone(),
        })
    }

    fn url_for(&self, request: &Request) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport("API URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(request.segments());
        Ok(url)
    }
}

impl RestClient for HttpClient {
    async fn send(&self, request: &Request) -> Result<Envelope, ApiError> {
        let url = self.url_for(request)?;
        let method = request.method();

        let mut builder = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Put => self.http.put(url),
        };
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        debug!(?method, path = %request.path(), "sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = server_message(&body);
            warn!(status = status.as_u16(), path = %request.path(), ?message, "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Envelope::from_slice(&body)?)
    }
}
