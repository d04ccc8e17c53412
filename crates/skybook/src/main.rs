//! `skybook` - flight booking assistant bot
//!
//! This binary runs the booking bot over the console gateway and provides
//! inspection commands for the booking database and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use skybook::bot::Bot;
use skybook::cli::{Cli, Command, ConfigCommand, RunCommand, StatusCommand};
use skybook::gateway::console::ConsoleGateway;
use skybook::gateway::ChatGateway;
use skybook::{init_logging, Config, Store};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Run(run_cmd) => handle_run(config, run_cmd),
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_run(mut config: Config, cmd: RunCommand) -> anyhow::Result<()> {
    if let Some(database) = cmd.database {
        config.storage.database_path = Some(database);
    }
    if let Some(prefix) = cmd.prefix {
        config.bot.command_prefix = prefix;
    }
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let store = Store::open(config.database_path())?;
        info!(path = %store.path().display(), "booking database opened");

        let mut gateway = ConsoleGateway::new(config.bot.command_prefix.clone());
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        gateway.start(tx).await?;

        let bot = Bot::new(Arc::new(gateway), store, Arc::new(config));
        bot.run(rx).await;
        Ok(())
    })
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let store = Store::open(config.database_path())?;
    let stats = store.stats()?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("skybook status");
        println!("--------------");
        println!("Database:       {}", store.path().display());
        println!("Bookings:       {}", stats.total_bookings);
        println!(
            "Oldest booking: {}",
            stats
                .oldest_booking
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
        );
        println!(
            "Newest booking: {}",
            stats
                .newest_booking
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
        );
        println!("Size (bytes):   {}", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:    {}", config.database_path().display());
                println!();
                println!("[Bot]");
                println!("  Token:            {}", mask_token(&config.bot.token));
                println!("  Command prefix:   {}", config.bot.command_prefix);
                println!("  Reply timeout:    {}s", config.bot.reply_timeout_secs);
                println!("  Menu timeout:     {}s", config.bot.menu_timeout_secs);
                println!();
                println!("[Session]");
                println!("  Draft TTL:        {}s", config.session.draft_ttl_secs);
                println!("  Sweep interval:   {}s", config.session.sweep_interval_secs);
                println!();
                println!("[Display]");
                println!(
                    "  Fields per page:  {}",
                    config.display.max_fields_per_page
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

/// Never print the token itself, only whether one is set.
fn mask_token(token: &Option<String>) -> &'static str {
    if token.is_some() {
        "(set)"
    } else {
        "(not set)"
    }
}
