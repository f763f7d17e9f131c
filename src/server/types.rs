// src/server/types.rs
// Wire shapes for the chat proxy and admin endpoints.

use serde::{Deserialize, Serialize};

/// Chat proxy request: the new message plus the caller's view of history.
#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<WireTurn>,
}

/// One prior turn as the widget sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTurn {
    pub role: String,
    pub parts: String,
}

/// Chat proxy response. Logical failures are carried in-band with a
/// transport-success status so the widget can render them as a chat bubble.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatApiResponse {
    Text { text: String },
    Error { error: String },
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedPayload {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstructionsPayload {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub project_type: String,
}
