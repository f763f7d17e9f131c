// src/main.rs

use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use concierge::config::CONFIG;
use concierge::llm::gemini::GeminiClient;
use concierge::{server, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = CONFIG.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting concierge chat service");
    info!("Model fallback chain: {}", CONFIG.model_fallback);

    let pool = store::create_pool(&CONFIG.database_url).await?;
    store::init_schema(&pool).await?;

    let backend = Arc::new(GeminiClient::from_env()?);

    server::run(pool, backend).await
}
