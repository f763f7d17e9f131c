// src/widget/mod.rs
// Client-side chat orchestration: optimistic transcript state, at most one
// in-flight request, best-effort persistence.

pub mod client;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::warn;

use crate::history;
use crate::session::SessionContext;
use crate::store::{MessageStore, Role};

/// One transcript entry as the widget renders it.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetTurn {
    pub role: Role,
    pub content: String,
}

/// Outcome of one proxy round-trip. `Error` is the logical-failure payload
/// the proxy returns with a transport-success status.
#[derive(Debug, Clone)]
pub enum ChatReply {
    Text(String),
    Error(String),
}

/// The widget's view of the chat proxy.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn respond(&self, message: &str, history: &[WidgetTurn]) -> anyhow::Result<ChatReply>;
}

#[async_trait]
impl<T: ChatService + ?Sized> ChatService for std::sync::Arc<T> {
    async fn respond(&self, message: &str, history: &[WidgetTurn]) -> anyhow::Result<ChatReply> {
        (**self).respond(message, history).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The exchange ran to completion (including an inline error turn).
    Completed,
    /// Whitespace-only input: no proxy call, no persisted turn.
    EmptyInput,
    /// A submission is already in flight; this one was rejected.
    Busy,
}

/// Drives one embedded chat instance.
///
/// The identity is injected at construction; the widget never reaches into
/// ambient storage itself.
pub struct ChatWidget<S: ChatService> {
    session: SessionContext,
    store: MessageStore,
    service: S,
    transcript: Mutex<Vec<WidgetTurn>>,
    in_flight: AtomicBool,
}

impl<S: ChatService> ChatWidget<S> {
    pub fn new(session: SessionContext, store: MessageStore, service: S) -> Self {
        Self {
            session,
            store,
            service,
            transcript: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// A distinguishable pending indicator is rendered while this is true.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn transcript(&self) -> Vec<WidgetTurn> {
        self.transcript.lock().await.clone()
    }

    /// Load the visible transcript for this visitor. A fetch failure yields
    /// an empty chat rather than blocking the UI.
    pub async fn open(&self) {
        match history::load_history(
            self.store.pool(),
            &self.session.session_id,
            self.session.user_id.as_deref(),
        )
        .await
        {
            Ok(turns) => {
                let mut transcript = self.transcript.lock().await;
                *transcript = turns
                    .into_iter()
                    .map(|turn| WidgetTurn {
                        role: turn.role,
                        content: turn.content,
                    })
                    .collect();
            }
            Err(e) => {
                warn!(error = %e, "failed to load chat history, starting empty");
            }
        }
    }

    /// Submit one message: optimistic append, fire-and-forget persistence,
    /// one proxy round-trip, inline error rendering.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let message = input.trim();
        if message.is_empty() {
            return SubmitOutcome::EmptyInput;
        }

        // At most one in-flight request per widget instance.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SubmitOutcome::Busy;
        }

        // Snapshot history before appending: the proxy receives the prior
        // turns, with the new message carried separately.
        let history = {
            let mut transcript = self.transcript.lock().await;
            let history = transcript.clone();
            transcript.push(WidgetTurn {
                role: Role::User,
                content: message.to_string(),
            });
            history
        };

        // Persist the user leg without holding up the exchange.
        let store = self.store.clone();
        let session = self.session.clone();
        let content = message.to_string();
        tokio::spawn(async move {
            if let Err(e) = store
                .append_turn(
                    &session.session_id,
                    session.user_id.as_deref(),
                    Role::User,
                    &content,
                )
                .await
            {
                warn!(error = %e, "failed to persist user turn");
            }
        });

        let bubble = match self.service.respond(message, &history).await {
            Ok(ChatReply::Text(text)) => {
                if let Err(e) = self
                    .store
                    .append_turn(
                        &self.session.session_id,
                        self.session.user_id.as_deref(),
                        Role::Model,
                        &text,
                    )
                    .await
                {
                    warn!(error = %e, "failed to persist model turn");
                }
                text
            }
            Ok(ChatReply::Error(message)) => format!("Technical error: {}", message),
            Err(e) => format!("Technical error: {}", e),
        };

        self.transcript.lock().await.push(WidgetTurn {
            role: Role::Model,
            content: bubble,
        });

        self.in_flight.store(false, Ordering::SeqCst);
        SubmitOutcome::Completed
    }
}
