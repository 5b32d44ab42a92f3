use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plangate::api::{create_router, AppState};
use plangate::config::{Config, CredentialSource};

#[derive(Parser)]
#[command(name = "plangate")]
#[command(about = "Prompt gateway for OpenAI, Anthropic and Gemini")]
struct Args {
    /// Bind address, overrides PLANGATE_HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides PLANGATE_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plangate=info,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    match &config.credentials.source {
        CredentialSource::Env => tracing::info!("Reading provider keys from environment"),
        CredentialSource::Remote { url, .. } => {
            tracing::info!("Reading provider keys from key service at {}", url)
        }
    }
    if config.server.keys_tokens.is_empty() {
        tracing::info!("PLANGATE_KEYS_TOKENS is not set, /api/keys is disabled");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)?;
    let app = create_router(state);

    tracing::info!("Plangate starting on http://{}", addr);
    tracing::info!("  Generate:     http://{}/api/generate", addr);
    tracing::info!("  Health check: http://{}/api/health", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
