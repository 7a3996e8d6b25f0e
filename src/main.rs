//! Main entry point for the Memory Rush game server
//!
//! Loads configuration, initializes logging, binds the TCP listener, and
//! serves one game session until a shutdown signal arrives.

use anyhow::Result;
use clap::Parser;
use memory_rush::config::{validate_config, AppConfig};
use memory_rush::error::GameError;
use memory_rush::server::GameServer;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Memory Rush Server - multiplayer memory card game over TCP
#[derive(Parser)]
#[command(
    name = "memory-rush",
    version,
    about = "Authoritative turn coordinator for multiplayer memory card games",
    long_about = "Memory Rush hosts a shared memory card game over a line-based TCP \
                 protocol. Players are admitted in arrival order, take turns revealing \
                 pairs of cards, and lose their turn when the turn timer expires."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Bind host override
    #[arg(long, value_name = "HOST", help = "Override the interface to bind")]
    host: Option<String>,

    /// Port override
    #[arg(short, long, value_name = "PORT", help = "Override the listening port")]
    port: Option<u16>,

    /// Deck size override
    #[arg(long, value_name = "PAIRS", help = "Override the number of card pairs")]
    pairs: Option<u32>,

    /// Lobby size override
    #[arg(long, value_name = "COUNT", help = "Override the maximum number of players")]
    max_players: Option<usize>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without starting the server")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with server information
fn display_startup_banner(config: &AppConfig) {
    info!("🃏 Memory Rush Game Server v{}", memory_rush::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Listen address: {}", config.server.bind_address());
    info!(
        "   Cards: {} ({} pairs)",
        config.game.total_cards(),
        config.game.num_pairs
    );
    info!(
        "   Players: start after {:?} with {}, immediately with {}",
        config.game.start_grace(),
        config.game.min_players,
        config.game.max_players
    );
    info!("   Turn timeout: {:?}", config.game.turn_timeout());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment, file, and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }

    if let Some(pairs) = args.pairs {
        config.game.num_pairs = pairs;
    }

    if let Some(max_players) = args.max_players {
        config.game.max_players = max_players;
    }

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    validate_config(&config).map_err(|e| GameError::Configuration {
        message: e.to_string(),
    })?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(config_path) = &args.config {
        info!("Loaded configuration from: {}", config_path.display());
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting server");
        return Ok(());
    }

    display_startup_banner(&config);

    let server = match GameServer::bind(&config.server.bind_address(), config.game.clone()).await
    {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let coordinator = server.coordinator();
    let shutdown = server.shutdown_handle();
    let mut server_task = tokio::spawn(server.run());

    info!("✅ Memory Rush server is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    let shutdown_requested = tokio::select! {
        _ = wait_for_shutdown_signal() => true,
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => info!("Server stopped"),
                Ok(Err(e)) => error!("Server failed: {:#}", e),
                Err(e) => error!("Server task panicked: {}", e),
            }
            false
        }
    };

    if shutdown_requested {
        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        if shutdown.send(()).is_err() {
            warn!("Server already stopped");
        }
        match tokio::time::timeout(config.shutdown_timeout(), &mut server_task).await {
            Ok(_) => info!("✅ Graceful shutdown completed successfully"),
            Err(_) => {
                warn!("⚠️  Shutdown timeout exceeded, forcing exit");
                server_task.abort();
            }
        }
    }

    let stats = coordinator.stats().await;
    info!(
        "Session totals: {} games, {} flips, {} matches, {} timeouts, {} chat messages, {} rejected",
        stats.games_started,
        stats.flips,
        stats.matches,
        stats.timeouts,
        stats.chat_messages,
        stats.rejected_admissions
    );
    match serde_json::to_string(&coordinator.snapshot().await) {
        Ok(snapshot) => info!("Final session state: {}", snapshot),
        Err(e) => warn!("Failed to serialize session state: {}", e),
    }

    info!("🛑 Memory Rush server stopped");
    Ok(())
}
