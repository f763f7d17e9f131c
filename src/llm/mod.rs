// src/llm/mod.rs
// Generative-language backend interface and failure taxonomy.

pub mod fallback;
pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::Role;

/// Upstream failure classes. The distinction is load-bearing: a quota
/// rejection aborts the fallback chain, everything else advances it.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model {model} rejected the request: {message}")]
    RateLimited { model: String, message: String },

    #[error("model {model} timed out after {seconds}s")]
    Timeout { model: String, seconds: u64 },

    #[error("model {model} failed: {message}")]
    Upstream { model: String, message: String },

    #[error("chat request was cancelled")]
    Cancelled,

    #[error("no language model candidates are configured")]
    NoCandidates,
}

impl ModelError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ModelError::RateLimited { .. })
    }
}

/// One prior exchange leg as supplied by the caller. The proxy trusts the
/// caller's view of history rather than re-deriving it from the store.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

/// Everything a single completion attempt needs.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system_instruction: String,
    pub history: Vec<HistoryTurn>,
    pub message: String,
}

/// A backend able to produce one text completion for a named model.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_quota_rejections_short_circuit() {
        let quota = ModelError::RateLimited {
            model: "a".into(),
            message: "429".into(),
        };
        let timeout = ModelError::Timeout {
            model: "a".into(),
            seconds: 30,
        };
        let upstream = ModelError::Upstream {
            model: "a".into(),
            message: "boom".into(),
        };

        assert!(quota.is_rate_limit());
        assert!(!timeout.is_rate_limit());
        assert!(!upstream.is_rate_limit());
    }
}
