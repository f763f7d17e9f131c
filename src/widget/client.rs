// src/widget/client.rs
// HTTP client for the chat proxy endpoint.

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;

use super::{ChatReply, ChatService, WidgetTurn};

/// Talks to `POST /api/chat`, carrying the caller's credential when present.
pub struct ProxyClient {
    client: HttpClient,
    endpoint: String,
    bearer: Option<String>,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new(),
            endpoint: endpoint.into(),
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[async_trait]
impl ChatService for ProxyClient {
    async fn respond(&self, message: &str, history: &[WidgetTurn]) -> anyhow::Result<ChatReply> {
        let body = json!({
            "message": message,
            "history": history
                .iter()
                .map(|turn| json!({ "role": turn.role.as_str(), "parts": turn.content }))
                .collect::<Vec<_>>(),
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let payload: serde_json::Value = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = payload.get("error").and_then(|v| v.as_str()) {
            return Ok(ChatReply::Error(error.to_string()));
        }

        let text = payload
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("malformed proxy response: {}", payload))?;
        Ok(ChatReply::Text(text.to_string()))
    }
}
