// src/session/mod.rs
// Durable anonymous session identity for the chat widget.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

/// Identity of the current visitor, injected into the widget at construction.
///
/// The session id is durable per browser profile; the user id appears once the
/// visitor authenticates and is carried on every persisted turn from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: Option<String>,
}

impl SessionContext {
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
        }
    }

    pub fn authenticated(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: Some(user_id.into()),
        }
    }
}

/// The single adapter that touches the client-local storage location.
///
/// Everything else receives the resolved identifier through `SessionContext`.
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage location under the platform data directory.
    pub fn default_location() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("concierge").join("session_id"),
        }
    }

    /// Return the persisted session identifier, generating and persisting a
    /// new one on first use.
    ///
    /// A storage-write failure is tolerated: the generated id is still
    /// returned and remains stable for the life of the process caller.
    pub fn ensure_session_id(&self) -> String {
        if let Ok(existing) = fs::read_to_string(&self.path) {
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }

        let id = generate_session_id();
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&self.path, &id) {
            warn!(error = %e, path = %self.path.display(), "failed to persist session id");
        }
        id
    }
}

/// Generates a new random session ID (UUID v4)
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_session_id_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::new(dir.path().join("session_id"));

        let first = storage.ensure_session_id();
        let second = storage.ensure_session_id();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn ensure_session_id_survives_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_id");
        fs::write(&path, "  abc-123\n").unwrap();

        let storage = SessionStorage::new(path);
        assert_eq!(storage.ensure_session_id(), "abc-123");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
