use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use relay_config::{ConfigLoader, DEFAULT_CONFIG_PATH};
use relay_logging::init_logging;
use relay_server::{api, AppState};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay alert webhooks as SNMP traps")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides `server.listen_address`
    #[arg(long)]
    listen_address: Option<String>,

    /// Validate the configuration, print it with secrets redacted and exit
    #[arg(long)]
    check_config: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new(&args.config);
    let mut config = loader.load()?;
    if let Some(listen_address) = args.listen_address {
        config.server.listen_address = listen_address;
    }

    init_logging(&config.logging)?;
    info!(config = %loader.path().display(), "Starting SNMP trap relay");

    if args.check_config {
        config.validate()?;
        println!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_address).await?;
    info!(address = %config.server.listen_address, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SNMP trap relay stopped");
    Ok(())
}
