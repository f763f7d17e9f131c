// src/store/config.rs
// Operator-controlled key/value settings, read on every proxy invocation.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::pricing::BasePrices;

pub const KEY_AI_INSTRUCTIONS: &str = "ai_instructions";
pub const KEY_BASE_PRICES: &str = "base_prices";

/// Key/value settings mutated only from the back-office.
///
/// Values are re-fetched on every read so an administrative edit takes effect
/// on the next chat message without a restart.
#[derive(Clone)]
pub struct ConfigStore {
    pool: SqlitePool,
}

impl ConfigStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO config (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The free-text system prompt for the chat proxy, if configured.
    pub async fn ai_instructions(&self) -> Result<Option<String>> {
        self.get(KEY_AI_INSTRUCTIONS).await
    }

    pub async fn set_ai_instructions(&self, value: &str) -> Result<()> {
        self.set(KEY_AI_INSTRUCTIONS, value).await
    }

    /// Per-project-type base prices, if configured.
    pub async fn base_prices(&self) -> Result<Option<BasePrices>> {
        match self.get(KEY_BASE_PRICES).await? {
            Some(raw) => {
                let prices =
                    serde_json::from_str(&raw).context("base_prices is not valid JSON")?;
                Ok(Some(prices))
            }
            None => Ok(None),
        }
    }

    pub async fn set_base_prices(&self, prices: &BasePrices) -> Result<()> {
        self.set(KEY_BASE_PRICES, &serde_json::to_string(prices)?)
            .await
    }
}
