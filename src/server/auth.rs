// src/server/auth.rs
// Bearer-token identity resolution.
//
// The auth service is an external collaborator; this adapter maps an opaque
// bearer token to a user id. An unresolvable or missing token degrades to an
// anonymous call rather than a rejection.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use sqlx::SqlitePool;
use tracing::warn;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub async fn resolve_identity(pool: &SqlitePool, token: Option<&str>) -> Option<String> {
    let token = token?;
    match sqlx::query_scalar::<_, String>("SELECT user_id FROM auth_tokens WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
    {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(error = %e, "token lookup failed, treating caller as anonymous");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_strips_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn non_bearer_scheme_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
