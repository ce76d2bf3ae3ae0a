use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;
use tracing::{debug, info};

use super::{DataSource, Payload, SourceError, SourceRequest};
use crate::config::TransportConfig;

/// POSTs `{ cmd, data, token }` to the configured endpoint and decodes the
/// envelope it answers with
#[derive(Clone)]
pub struct HttpSource {
    transport: TransportConfig,
    client: Client,
}

impl HttpSource {
    pub fn new(transport: TransportConfig) -> Result<Self, SourceError> {
        if transport.base_url.trim().is_empty() {
            return Err(SourceError::Config("base_url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(transport.request_timeout_ms))
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self { transport, client })
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }
}

impl DataSource for HttpSource {
    fn fetch(&self, request: &SourceRequest) -> Result<Payload, SourceError> {
        let command = request
            .command
            .as_deref()
            .unwrap_or(&self.transport.command);
        let body = json!({
            "cmd": command,
            "data": request.data,
            "token": self.transport.auth_token,
        });

        debug!(target: "source", "POST {} cmd={}", self.transport.base_url, command);
        let response = self
            .client
            .post(&self.transport.base_url)
            .json(&body)
            .send()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let payload = Payload::from_json_str(&text)?;
        info!(target: "source", "Received {} rows from {}", payload.rows.len(), self.transport.base_url);
        Ok(payload)
    }

    fn describe(&self) -> String {
        self.transport.base_url.clone()
    }
}
