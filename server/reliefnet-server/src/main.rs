use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reliefnet_server::{create_app, ReliefServer};

/// ReliefNet Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "reliefnet-server")]
#[command(about = "Disaster-relief coordination HTTP API server")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading any configuration
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.verbose);

    info!("Starting ReliefNet Engine HTTP Server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Bind address: {}:{}", args.host, args.port);

    let server = ReliefServer::from_env().await?;
    let app = create_app(server);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("ReliefNet server running on http://{addr}");
    info!("Health check available at: http://{addr}/health");
    info!("WebSocket endpoint: ws://{addr}/ws");

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("reliefnet_server={level},reliefnet={level},tower_http=info,sqlx=warn,reqwest=info")
            .into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
