//! Pixelboard Server
//!
//! Runs the slot scheduler, renders frames and serves the remote control API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use display_runtime::{DisplayMgr, FileStore, PluginMgr, PluginRegistry};

use pixelboard::config::AppConfig;
use pixelboard::plugins::register_builtin;
use pixelboard::render::{frame_channel, run_render_loop};
use pixelboard::server::{AppState, create_router};

/// Pixelboard Display Server
#[derive(Parser, Debug)]
#[command(name = "pixelboard")]
#[command(about = "Pixel display slot scheduler", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./pixelboard.toml")]
    config: PathBuf,

    /// Server host address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Directory for the persisted slot arrangement (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pixelboard=info,display_runtime=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let args = Args::parse();

    info!("Starting Pixelboard v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(&args.config).await?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.data_dir {
        config.storage.dir = dir;
    }

    // Create core components
    let mut registry = PluginRegistry::new();
    register_builtin(&mut registry, &config.plugins)?;
    info!(types = ?registry.type_names(), "Plugin types registered");

    let settings = config.display_settings();
    let display = DisplayMgr::new(settings.clone());
    let store = Arc::new(FileStore::new(&config.storage.dir));
    let plugins = Arc::new(PluginMgr::new(display.clone(), Arc::new(registry), store));

    let restored = plugins.load().await;
    info!(
        restored,
        slots = settings.slots,
        dir = %config.storage.dir.display(),
        "Slot arrangement loaded"
    );

    // Start the render loop
    let (frames_tx, frames_rx) = frame_channel(settings.width, settings.height);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let render_task = tokio::spawn(run_render_loop(
        display,
        config.display.frame_period(),
        frames_tx,
        shutdown_rx,
    ));

    // Create router
    let state = AppState::new(plugins.clone(), frames_rx);
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = render_task.await {
        error!("Render loop ended abnormally: {}", e);
    }

    if let Err(e) = plugins.save().await {
        warn!("Failed to save slot arrangement on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
