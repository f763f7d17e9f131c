// src/llm/gemini.rs
// Client for the generateContent API of the generative-language backend.

use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerateRequest, GenerativeBackend, ModelError};
use crate::config::CONFIG;
use crate::store::Role;

/// Gemini client. One instance is shared across proxy invocations; the model
/// name is supplied per call so the fallback policy can walk its candidates.
pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            base_url: CONFIG.gemini_base_url.clone(),
            timeout: CONFIG.model_timeout_duration(),
        }
    }

    /// Create from environment variable
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    /// Build request contents: prior turns followed by the new user message.
    fn build_contents(request: &GenerateRequest) -> Vec<GeminiContent> {
        let mut contents = Vec::new();

        for turn in &request.history {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
            };
            contents.push(GeminiContent {
                role: role.to_string(),
                parts: vec![GeminiTextPart {
                    text: turn.text.clone(),
                }],
            });
        }

        contents.push(GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiTextPart {
                text: request.message.clone(),
            }],
        });

        contents
    }

    fn upstream(model: &str, message: impl Into<String>) -> ModelError {
        ModelError::Upstream {
            model: model.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, ModelError> {
        let api_request = GeminiRequest {
            contents: Self::build_contents(request),
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiTextPart {
                    text: request.system_instruction.clone(),
                }],
            }),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&api_request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        model: model.to_string(),
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    Self::upstream(model, e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::RateLimited {
                model: model.to_string(),
                message: body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::upstream(model, format!("{} - {}", status, body)));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Self::upstream(model, format!("malformed response: {}", e)))?;

        if let Some(error) = api_response.error {
            // Quota exhaustion can also arrive as an in-body error object
            if error.code == Some(429) || error.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
                return Err(ModelError::RateLimited {
                    model: model.to_string(),
                    message: error.message,
                });
            }
            return Err(Self::upstream(model, error.message));
        }

        let text = api_response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Self::upstream(model, "empty response"));
        }

        Ok(text)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize, Clone)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize, Clone)]
struct GeminiTextPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContentResponse,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    code: Option<i64>,
    message: String,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HistoryTurn;

    #[test]
    fn build_contents_maps_roles_and_appends_message() {
        let request = GenerateRequest {
            system_instruction: "You are helpful".into(),
            history: vec![
                HistoryTurn {
                    role: Role::User,
                    text: "Hello".into(),
                },
                HistoryTurn {
                    role: Role::Model,
                    text: "Hi there!".into(),
                },
            ],
            message: "How are you?".into(),
        };

        let contents = GeminiClient::build_contents(&request);
        assert_eq!(contents.len(), 3); // 2 history + 1 current
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
        assert_eq!(contents[2].parts[0].text, "How are you?");
    }

    #[test]
    fn in_body_quota_error_parses() {
        let raw = r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, Some(429));
        assert_eq!(error.status.as_deref(), Some("RESOURCE_EXHAUSTED"));
    }
}
