//! Hosted row-store client.
//!
//! Talks to a PostgREST-style endpoint for pulls and upserts and opens the
//! realtime channel socket for change notifications.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::sync::Arc;

use super::error::RemoteError;
use super::protocol::{ChannelMessage, RemoteRow};
use super::realtime::{self, Subscription};
use super::remote::{ChangeNotifier, RemoteConnector, RemoteStore};
use crate::config::RemoteConfig;

/// Builds [`HostedClient`]s for one table/channel layout.
#[derive(Debug, Clone)]
pub struct HostedConnector {
    table: String,
    schema: String,
    channel: String,
}

impl HostedConnector {
    pub fn new(
        table: impl Into<String>,
        schema: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            schema: schema.into(),
            channel: channel.into(),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(
            config.table.value.clone(),
            config.schema.value.clone(),
            config.channel.value.clone(),
        )
    }
}

impl RemoteConnector for HostedConnector {
    fn connect(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<Arc<dyn RemoteStore>, RemoteError> {
        let client = HostedClient::new(
            endpoint,
            credential,
            &self.table,
            &self.schema,
            &self.channel,
        )?;
        Ok(Arc::new(client))
    }
}

/// Client for one hosted project.
pub struct HostedClient {
    base_url: String,
    credential: String,
    table: String,
    schema: String,
    channel: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for HostedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedClient")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl HostedClient {
    /// Creates a client. No network traffic happens until the first call.
    pub fn new(
        endpoint: &str,
        credential: &str,
        table: &str,
        schema: &str,
        channel: &str,
    ) -> Result<Self, RemoteError> {
        let credential = credential.trim();
        if endpoint.trim().is_empty() || credential.is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        let base_url = normalize_endpoint(endpoint)?;

        let mut headers = HeaderMap::new();
        let api_key =
            HeaderValue::from_str(credential).map_err(|_| RemoteError::InvalidCredential)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential))
            .map_err(|_| RemoteError::InvalidCredential)?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url,
            credential: credential.to_string(),
            table: table.to_string(),
            schema: schema.to_string(),
            channel: channel.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the REST URL of the row table.
    fn build_rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Builds the realtime socket URL.
    fn build_realtime_url(&self) -> String {
        // Convert http(s) to ws(s)
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };

        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base,
            urlencoding::encode(&self.credential)
        )
    }

    fn topic(&self) -> String {
        format!("realtime:{}", self.channel)
    }
}

#[async_trait]
impl RemoteStore for HostedClient {
    async fn pull_all(&self) -> Result<Vec<RemoteRow>, RemoteError> {
        let response = self
            .http
            .get(self.build_rest_url())
            .query(&[("select", "*")])
            .send()
            .await?;
        let response = check_status(response).await?;

        let rows = response
            .json::<Vec<RemoteRow>>()
            .await
            .map_err(|e| RemoteError::DecodeError(e.to_string()))?;
        tracing::debug!(rows = rows.len(), "pulled remote rows");
        Ok(rows)
    }

    async fn push(&self, key: &str, content: &Value) -> Result<(), RemoteError> {
        let row = RemoteRow::new(key, content.clone());
        let response = self
            .http
            .post(self.build_rest_url())
            .query(&[("on_conflict", "key")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await?;
        check_status(response).await?;
        tracing::debug!(key, "pushed remote row");
        Ok(())
    }

    async fn subscribe(&self, notify: ChangeNotifier) -> Result<Subscription, RemoteError> {
        let join = ChannelMessage::join(
            &self.topic(),
            &self.schema,
            &self.table,
            &self.credential,
            "1",
        );
        realtime::open_channel(&self.build_realtime_url(), join, notify).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status(status.as_u16(), body))
}

/// Trims trailing slashes and defaults bare hosts to https.
fn normalize_endpoint(endpoint: &str) -> Result<String, RemoteError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = reqwest::Url::parse(&candidate)
        .map_err(|e| RemoteError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RemoteError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(RemoteError::InvalidEndpoint(format!(
            "{}: missing host",
            endpoint
        )));
    }

    Ok(candidate)
}
