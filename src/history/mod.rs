// src/history/mod.rs
// Read-time transcript projection for the current visitor.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::store::{ChatTurn, Role};

/// Compute the visible transcript at chat-open time.
///
/// Anonymous visitors see the turns recorded under their session id. Once
/// authenticated, the projection is the union of the current session and any
/// history previously recorded under the account, so pre-login turns and
/// other-device turns merge into one transcript.
///
/// Ordering is `created_at` ascending; the implicit rowid breaks ties so
/// turns written within the same millisecond keep insertion order. A row
/// matching both predicates appears exactly once (primary-key uniqueness is
/// the dedup); distinct rows that duplicate a logical turn are preserved.
pub async fn load_history(
    pool: &SqlitePool,
    session_id: &str,
    user_id: Option<&str>,
) -> Result<Vec<ChatTurn>> {
    let rows = if let Some(user_id) = user_id {
        sqlx::query(
            r#"
            SELECT id, session_id, user_id, role, content, created_at
            FROM chat_messages
            WHERE session_id = ? OR user_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query(
            r#"
            SELECT id, session_id, user_id, role, content, created_at
            FROM chat_messages
            WHERE session_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await?
    };

    Ok(rows.into_iter().filter_map(row_to_turn).collect())
}

fn row_to_turn(row: SqliteRow) -> Option<ChatTurn> {
    let role: String = row.get("role");
    Some(ChatTurn {
        id: row.get("id"),
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        role: Role::parse(&role)?,
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}
