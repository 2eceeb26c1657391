//! HTTPS transport for the atVenu GraphQL endpoint.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use super::{GraphQLRequest, Transport};
use crate::config::ExportConfig;
use crate::error::TransportError;

/// Longest error body kept in a `TransportError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Sends GraphQL requests over HTTPS with the `x-api-key` header.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ExportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("atvenu-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(operation = request.operation_name))]
    async fn send(&self, request: &GraphQLRequest) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok());
            return Err(TransportError::RateLimited { retry_after });
        }

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
