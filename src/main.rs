use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use chat_relay::chain::conversation::StreamingConversationChain;
use chat_relay::chain::prompt::ChatPromptTemplate;
use chat_relay::config::{Cli, Config, Secrets};
use chat_relay::llm::openai::OpenAiClient;
use chat_relay::memory::store::new_shared_store;
use chat_relay::metrics::Metrics;
use chat_relay::server::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "chat_relay=debug,tower_http=debug"
    } else {
        "chat_relay=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("chat-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration. A missing API key stops startup here.
    let config = Config::load(&cli.config)?;
    let secrets = Secrets::load(&cli.env_file)?;

    info!(
        api_base = config.provider.api_base,
        model = config.provider.model,
        temperature = config.provider.temperature,
        "Configuration loaded"
    );

    let model = OpenAiClient::new(&config.provider, secrets.api_key)?;
    let chain = StreamingConversationChain::new(
        Arc::new(model),
        new_shared_store(),
        ChatPromptTemplate::new(config.prompt.system.clone()),
    )
    .with_token_buffer(config.server.token_buffer);

    let state = Arc::new(AppState::new(chain, Metrics::new()?));

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = cli.listen.unwrap_or(config.server.listen);
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
