//! Quantum Mind server binary - composition root.
//!
//! 1. Load configuration (file, then environment, then CLI flags), or
//!    write a default file with `--init-config`
//! 2. Validate it; a missing generation key stops startup
//! 3. Build the speech, generation and gate services
//! 4. Start the axum HTTP server

mod cli;

use clap::Parser;

use mind_api::routes;
use mind_api::state::AppState;
use mind_core::config::MindConfig;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let (config_file, explicit) = args.resolve_config_path();
    if args.init_config {
        if config_file.exists() {
            return Err(format!("{} already exists", config_file.display()).into());
        }
        MindConfig::default().save(&config_file)?;
        println!("Wrote default configuration to {}", config_file.display());
        return Ok(());
    }
    let mut config = if explicit {
        MindConfig::load(&config_file)?
    } else {
        MindConfig::load_or_default(&config_file)
    };
    config.apply_env();
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref level) = args.log_level {
        config.general.log_level = level.clone();
    }

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Quantum Mind v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), explicit, "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let state = AppState::from_config(config.clone())?;
    tracing::info!(keys = state.gate.table().len(), "Access gate ready");

    routes::start_server(&config, state).await?;

    Ok(())
}
