mod config;
mod logging;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::{config_path, FleetConfig, PORT_ENV};
use crate::logging::LogFormat;

/// FleetFlow trip assignment service.
#[derive(Parser)]
#[command(name = "fleetflow", version, about = "FleetFlow trip assignment service")]
struct Cli {
    /// Log line format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the FleetFlow HTTP API server
    Serve {
        /// Port to listen on (overrides FLEETFLOW_PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
        /// Path to a fleetflow.toml file (overrides FLEETFLOW_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a configuration file, then exit
    CheckConfig {
        /// Path to a fleetflow.toml file (overrides FLEETFLOW_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    match cli.command {
        Commands::Serve { port, config } => cmd_serve(port, config),
        Commands::CheckConfig { config } => cmd_check_config(config),
    }
}

fn load_or_exit(flag: Option<PathBuf>) -> FleetConfig {
    match FleetConfig::load(config_path(flag).as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn cmd_serve(port: Option<u16>, config: Option<PathBuf>) {
    let config = load_or_exit(config);
    let env_port = std::env::var(PORT_ENV).ok();
    let port = match config.resolve_port(port, env_port.as_deref()) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(serve::start_server(config, port)) {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}

fn cmd_check_config(config: Option<PathBuf>) {
    let config = load_or_exit(config);
    println!(
        "configuration OK: port {}, {} vehicle(s), {} driver(s), {} route(s)",
        config.server.port,
        config.vehicles.len(),
        config.drivers.len(),
        config.fuel.routes.len()
    );
}
