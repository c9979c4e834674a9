//! HTTP transport used for deploy triggers and status probes

use crate::errors::{AdminError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

/// Raw answer from a trigger endpoint
#[derive(Debug, Clone)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: String,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network seam for deploys and probes; timeouts are applied by callers
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&SecretString>,
        headers: &[(&'static str, &'static str)],
        body: &Value,
    ) -> Result<TriggerResponse>;

    /// Issue a HEAD request, returning the status code
    async fn head(&self, url: &str) -> Result<u16>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("brandsite-admin/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AdminError::Http)?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&SecretString>,
        headers: &[(&'static str, &'static str)],
        body: &Value,
    ) -> Result<TriggerResponse> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose_secret());
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        debug!("POST trigger answered {}", status);

        Ok(TriggerResponse { status, body })
    }

    async fn head(&self, url: &str) -> Result<u16> {
        let response = self.client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}
