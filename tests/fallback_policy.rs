// tests/fallback_policy.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use concierge::llm::fallback::FallbackPolicy;
use concierge::llm::{GenerateRequest, GenerativeBackend, ModelError};

#[derive(Clone)]
enum Script {
    Reply(&'static str),
    RateLimited,
    Timeout,
    Fail,
    Hang,
}

struct ScriptedBackend {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(model, script)| (model.to_string(), script.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(
        &self,
        model: &str,
        _request: &GenerateRequest,
    ) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(model.to_string());
        match self.scripts.get(model) {
            Some(Script::Reply(text)) => Ok(text.to_string()),
            Some(Script::RateLimited) => Err(ModelError::RateLimited {
                model: model.to_string(),
                message: "quota exceeded".to_string(),
            }),
            Some(Script::Timeout) => Err(ModelError::Timeout {
                model: model.to_string(),
                seconds: 30,
            }),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!("hung attempt should have been cancelled")
            }
            _ => Err(ModelError::Upstream {
                model: model.to_string(),
                message: "boom".to_string(),
            }),
        }
    }
}

fn request() -> GenerateRequest {
    GenerateRequest {
        system_instruction: "You are helpful".to_string(),
        history: vec![],
        message: "hello".to_string(),
    }
}

#[tokio::test]
async fn first_success_wins() {
    let backend = ScriptedBackend::new(&[("a", Script::Reply("from a")), ("b", Script::Reply("from b"))]);
    let policy = FallbackPolicy::new(vec!["a".to_string(), "b".to_string()]);

    let result = policy
        .run(&backend, &request(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result, "from a");
    assert_eq!(backend.calls(), vec!["a"]);
}

#[tokio::test]
async fn non_quota_failure_advances_to_next_candidate() {
    let backend = ScriptedBackend::new(&[("a", Script::Fail), ("b", Script::Reply("from b"))]);
    let policy = FallbackPolicy::new(vec!["a".to_string(), "b".to_string()]);

    let result = policy
        .run(&backend, &request(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result, "from b");
    assert_eq!(backend.calls(), vec!["a", "b"]);
}

#[tokio::test]
async fn timeout_advances_like_any_non_quota_failure() {
    let backend = ScriptedBackend::new(&[("a", Script::Timeout), ("b", Script::Reply("from b"))]);
    let policy = FallbackPolicy::new(vec!["a".to_string(), "b".to_string()]);

    let result = policy
        .run(&backend, &request(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result, "from b");
    assert_eq!(backend.calls(), vec!["a", "b"]);
}

#[tokio::test]
async fn quota_rejection_abandons_the_chain() {
    let backend = ScriptedBackend::new(&[("a", Script::RateLimited), ("b", Script::Reply("from b"))]);
    let policy = FallbackPolicy::new(vec!["a".to_string(), "b".to_string()]);

    let err = policy
        .run(&backend, &request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_rate_limit());
    assert_eq!(backend.calls(), vec!["a"], "b must never be attempted");
}

#[tokio::test]
async fn exhausted_chain_surfaces_last_error() {
    let backend = ScriptedBackend::new(&[("a", Script::Fail), ("b", Script::Fail)]);
    let policy = FallbackPolicy::new(vec!["a".to_string(), "b".to_string()]);

    let err = policy
        .run(&backend, &request(), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        ModelError::Upstream { model, .. } => assert_eq!(model, "b"),
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(backend.calls(), vec!["a", "b"]);
}

#[tokio::test]
async fn empty_candidate_list_is_a_generic_failure() {
    let backend = ScriptedBackend::new(&[]);
    let policy = FallbackPolicy::new(vec![]);

    let err = policy
        .run(&backend, &request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::NoCandidates));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn pre_cancelled_token_stops_before_any_attempt() {
    let backend = ScriptedBackend::new(&[("a", Script::Reply("from a"))]);
    let policy = FallbackPolicy::new(vec!["a".to_string()]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = policy.run(&backend, &request(), &cancel).await.unwrap_err();
    assert!(matches!(err, ModelError::Cancelled));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn cancellation_aborts_a_hung_attempt() {
    let backend = ScriptedBackend::new(&[("a", Script::Hang)]);
    let policy = FallbackPolicy::new(vec!["a".to_string()]);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = policy.run(&backend, &request(), &cancel).await.unwrap_err();
    assert!(matches!(err, ModelError::Cancelled));
    assert_eq!(backend.calls(), vec!["a"]);
}
