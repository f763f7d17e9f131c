// src/config/mod.rs
// Environment-driven configuration, loaded once at startup.

use once_cell::sync::Lazy;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ConciergeConfig {
    // ── Database Configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Server Configuration
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,

    // ── Generative-Language Backend
    pub gemini_base_url: String,
    /// Ordered candidate models, highest preference first, comma-separated.
    pub model_fallback: String,
    /// Per-candidate upstream timeout in seconds.
    pub model_timeout: u64,

    // ── Logging Configuration
    pub log_level: String,
}

/// Read an environment variable, tolerating trailing comments and whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl ConciergeConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists
        let _ = dotenvy::dotenv();

        Self {
            database_url: env_var_or("DATABASE_URL", "sqlite:./concierge.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 10),
            host: env_var_or("CONCIERGE_HOST", "0.0.0.0".to_string()),
            port: env_var_or("CONCIERGE_PORT", 8080),
            request_timeout: env_var_or("CONCIERGE_REQUEST_TIMEOUT", 60),
            gemini_base_url: env_var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com".to_string(),
            ),
            model_fallback: env_var_or(
                "CONCIERGE_MODEL_FALLBACK",
                "gemini-1.5-flash,gemini-pro".to_string(),
            ),
            model_timeout: env_var_or("CONCIERGE_MODEL_TIMEOUT", 30),
            log_level: env_var_or("CONCIERGE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Ordered model candidates parsed from the comma-separated list.
    pub fn fallback_models(&self) -> Vec<String> {
        self.model_fallback
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-candidate upstream timeout
    pub fn model_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.model_timeout)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<ConciergeConfig> = Lazy::new(ConciergeConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(model_fallback: &str) -> ConciergeConfig {
        ConciergeConfig {
            database_url: "sqlite::memory:".to_string(),
            sqlite_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout: 60,
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            model_fallback: model_fallback.to_string(),
            model_timeout: 30,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn fallback_models_splits_and_trims() {
        let config = test_config(" gemini-1.5-flash , gemini-pro ,");
        assert_eq!(
            config.fallback_models(),
            vec!["gemini-1.5-flash".to_string(), "gemini-pro".to_string()]
        );
    }

    #[test]
    fn fallback_models_empty_list() {
        let config = test_config("  ");
        assert!(config.fallback_models().is_empty());
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = test_config("gemini-pro");
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}
