// src/llm/fallback.rs
// Ordered-candidate fallback over the generative-language backend.

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{GenerateRequest, GenerativeBackend, ModelError};
use crate::config::CONFIG;

/// Ordered priority list of model candidates, highest preference first.
///
/// Candidates are tried in sequence until one succeeds. A quota rejection
/// aborts the whole chain: when the account-wide quota is the suspected
/// cause, a fast uniform failure beats inconsistent partial degradation.
/// Every invocation restarts from the top of the list; there is no backoff
/// and no state carried across invocations.
#[derive(Clone)]
pub struct FallbackPolicy {
    models: Vec<String>,
}

impl FallbackPolicy {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    /// Candidate list from configuration, so new models can be added
    /// without redeploying logic.
    pub fn from_config() -> Self {
        Self::new(CONFIG.fallback_models())
    }

    pub fn candidates(&self) -> &[String] {
        &self.models
    }

    /// Produce exactly one text response, or the failure that ended the chain.
    pub async fn run(
        &self,
        backend: &dyn GenerativeBackend,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ModelError> {
        if self.models.is_empty() {
            return Err(ModelError::NoCandidates);
        }

        let mut last_error = None;

        for model in &self.models {
            if cancel.is_cancelled() {
                return Err(ModelError::Cancelled);
            }

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ModelError::Cancelled),
                result = backend.generate(model, request) => result,
            };

            match attempt {
                Ok(text) => return Ok(text),
                Err(err) if err.is_rate_limit() => {
                    warn!(model = %model, error = %err, "quota rejection, abandoning fallback chain");
                    return Err(err);
                }
                Err(err) => {
                    warn!(model = %model, error = %err, "candidate failed, trying next");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or(ModelError::NoCandidates))
    }
}
