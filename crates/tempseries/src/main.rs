//! `tempseries` - CLI for the temperature series service
//!
//! This binary runs the HTTP server and inspects configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use tempseries::cli::{Cli, Command, ConfigCommand, ServeCommand};
use tempseries::{api, init_logging, Config, EventPublisher, RecordService, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match cli.command {
        Command::Serve(cmd) => {
            let config = Config::load_from(cli.config.clone())?;
            handle_serve(config, cmd).await
        }
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind_address = bind;
    }
    if let Some(database) = cmd.database {
        config.storage.database_path = Some(database);
    }
    let addr = config.bind_addr()?;

    let database_path = config.database_path();
    let storage = Storage::open(&database_path)
        .with_context(|| format!("opening database {}", database_path.display()))?;
    info!("Using database {}", storage.path().display());

    let service = RecordService::from_config(Arc::new(storage), &config);
    if let Some(events) = service.events() {
        spawn_event_logger(events);
    }

    api::serve(service, &config.server, addr).await?;
    Ok(())
}

/// Log every record event at debug level.
fn spawn_event_logger(events: &EventPublisher) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(id = event.id(), kind = event.kind(), "Record event"),
                Err(RecvError::Lagged(skipped)) => warn!("Event logger skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn handle_config(config_path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
                println!("  CORS enabled:       {}", config.server.cors_enabled);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Validation]");
                println!("  Enforce range:      {}", config.validation.enforce_range);
                println!(
                    "  Range:              [{}, {}]",
                    config.validation.min_value, config.validation.max_value
                );
                println!();
                println!("[Listing]");
                println!("  Default limit:      {}", config.listing.default_limit);
                println!("  Max limit:          {}", config.listing.max_limit);
                println!();
                println!("[Events]");
                println!("  Enabled:            {}", config.events.enabled);
                println!("  Channel capacity:   {}", config.events.channel_capacity);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
