//! Tec assistant server binary
//!
//! Run with: cargo run -p tec-assistant --bin tec-assistant-server

use tec_assistant::{config::AssistantConfig, server::AssistantServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tec_assistant=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Tec 🤖 AI Assistant                    ║
║                  Amman Arab University                    ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config_path = std::env::var_os("TEC_CONFIG").map(std::path::PathBuf::from);
    let config = AssistantConfig::resolve(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Retrieval strategy: {}", config.retrieval.strategy);
    tracing::info!("  - Similarity threshold: {}", config.retrieval.similarity_threshold);
    tracing::info!("  - Chat model: {}", config.llm.model);
    tracing::info!(
        "  - Sessions: ttl {}s, max {}",
        config.sessions.ttl_secs,
        config.sessions.max_sessions
    );

    if config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /api/chat will be unavailable");
    }

    let server = AssistantServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/api/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/chat          - Chat with Tec");
    println!("  POST   /api/search        - Knowledge lookup only");
    println!("  DELETE /api/sessions/:id  - Forget a conversation");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
