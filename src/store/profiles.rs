// src/store/profiles.rs
// Client profile lookups for proxy personalization.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

/// Contact record for an authenticated client.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email: String,
}

impl Profile {
    /// Structured context block appended to the system instruction so the
    /// model can personalize its reply.
    pub fn context_block(&self) -> String {
        format!(
            "\n\nCURRENT CLIENT CONTEXT:\nName: {}\nCompany: {}\nEmail: {}\n\
             Use this information to personalize the conversation, addressing \
             the client by name when appropriate.",
            self.full_name.as_deref().unwrap_or("not provided"),
            self.company_name.as_deref().unwrap_or("not provided"),
            self.email,
        )
    }
}

/// Absence of a profile is not an error: the context block is simply omitted.
pub async fn fetch_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<Profile>> {
    let row: Option<(Option<String>, Option<String>, String)> = sqlx::query_as(
        "SELECT full_name, company_name, email FROM profiles WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(full_name, company_name, email)| Profile {
        full_name,
        company_name,
        email,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_block_includes_contact_fields() {
        let profile = Profile {
            full_name: Some("Ada Lovelace".to_string()),
            company_name: None,
            email: "ada@example.com".to_string(),
        };

        let block = profile.context_block();
        assert!(block.contains("Name: Ada Lovelace"));
        assert!(block.contains("Company: not provided"));
        assert!(block.contains("Email: ada@example.com"));
    }
}
