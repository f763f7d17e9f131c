//! HTTP handlers for the chat proxy and back-office operations

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::AppState;
use super::auth;
use super::types::{
    ChatApiRequest, ChatApiResponse, DeletedPayload, HistoryQuery, InstructionsPayload, QuoteQuery,
    WireTurn,
};
use crate::history;
use crate::llm::{GenerateRequest, HistoryTurn};
use crate::pricing::{self, BasePrices, ProjectType, Quote};
use crate::store::config::ConfigStore;
use crate::store::profiles::fetch_profile;
use crate::store::{ChatTurn, MessageStore, Role};

/// Substituted when no system instruction has been configured.
pub const DEFAULT_INSTRUCTIONS: &str =
    "You are the studio's virtual assistant. Help visitors scope their \
     projects and answer questions about our services.";

/// Health check and status endpoint
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    let database = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    Json(json!({
        "status": "ok",
        "database": database,
        "models": state.fallback.candidates(),
    }))
}

/// Chat proxy endpoint.
///
/// Logical failures come back as `{ "error": ... }` with HTTP 200 so the
/// widget renders them inline instead of tripping transport-error handling.
pub async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatApiRequest>,
) -> Json<ChatApiResponse> {
    if payload.message.trim().is_empty() {
        return Json(ChatApiResponse::Error {
            error: "message must not be empty".to_string(),
        });
    }

    match respond(&state, &headers, &payload).await {
        Ok(text) => Json(ChatApiResponse::Text { text }),
        Err(err) => {
            warn!(error = %err, "chat proxy failed");
            Json(ChatApiResponse::Error {
                error: err.to_string(),
            })
        }
    }
}

async fn respond(
    state: &AppState,
    headers: &HeaderMap,
    payload: &ChatApiRequest,
) -> anyhow::Result<String> {
    let identity = auth::resolve_identity(&state.db, auth::bearer_token(headers)).await;
    let config = ConfigStore::new(state.db.clone());

    // Re-read on every invocation so an administrative edit takes effect on
    // the next message.
    let mut system_instruction = match config.ai_instructions().await {
        Ok(Some(value)) => value,
        Ok(None) => DEFAULT_INSTRUCTIONS.to_string(),
        Err(e) => {
            warn!(error = %e, "failed to read ai_instructions, using default");
            DEFAULT_INSTRUCTIONS.to_string()
        }
    };

    if let Some(user_id) = &identity {
        match fetch_profile(&state.db, user_id).await {
            Ok(Some(profile)) => system_instruction.push_str(&profile.context_block()),
            Ok(None) => {}
            Err(e) => warn!(error = %e, user_id = %user_id, "profile lookup failed"),
        }
    }

    let request = GenerateRequest {
        system_instruction,
        history: payload.history.iter().map(wire_turn_to_history).collect(),
        message: payload.message.clone(),
    };

    let cancel = state.shutdown.child_token();
    let text = state
        .fallback
        .run(state.backend.as_ref(), &request, &cancel)
        .await?;
    Ok(text)
}

fn wire_turn_to_history(turn: &WireTurn) -> HistoryTurn {
    HistoryTurn {
        role: if turn.role == "user" {
            Role::User
        } else {
            Role::Model
        },
        text: turn.parts.clone(),
    }
}

/// Transcript projection for a visitor; the union predicate applies when the
/// bearer token resolves to an identity.
pub async fn history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatTurn>>, (StatusCode, String)> {
    let identity = auth::resolve_identity(&state.db, auth::bearer_token(&headers)).await;
    let turns = history::load_history(&state.db, &params.session_id, identity.as_deref())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(turns))
}

/// Administrative bulk delete of a conversation
pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeletedPayload>, (StatusCode, String)> {
    let deleted = MessageStore::new(state.db.clone())
        .delete_conversation(&session_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(session_id = %session_id, deleted, "conversation deleted");
    Ok(Json(DeletedPayload { deleted }))
}

pub async fn instructions_handler(
    State(state): State<AppState>,
) -> Result<Json<InstructionsPayload>, (StatusCode, String)> {
    let value = ConfigStore::new(state.db.clone())
        .ai_instructions()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .unwrap_or_default();
    Ok(Json(InstructionsPayload { value }))
}

pub async fn update_instructions_handler(
    State(state): State<AppState>,
    Json(payload): Json<InstructionsPayload>,
) -> Result<StatusCode, (StatusCode, String)> {
    ConfigStore::new(state.db.clone())
        .set_ai_instructions(&payload.value)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn prices_handler(
    State(state): State<AppState>,
) -> Result<Json<Option<BasePrices>>, (StatusCode, String)> {
    let prices = ConfigStore::new(state.db.clone())
        .base_prices()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(prices))
}

pub async fn update_prices_handler(
    State(state): State<AppState>,
    Json(payload): Json<BasePrices>,
) -> Result<StatusCode, (StatusCode, String)> {
    ConfigStore::new(state.db.clone())
        .set_base_prices(&payload)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn quote_handler(
    State(state): State<AppState>,
    Query(params): Query<QuoteQuery>,
) -> Result<Json<Quote>, (StatusCode, String)> {
    let project_type = ProjectType::parse(&params.project_type).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("unknown project type: {}", params.project_type),
        )
    })?;

    let quote = pricing::quote(&ConfigStore::new(state.db.clone()), project_type).await;
    Ok(Json(quote))
}
