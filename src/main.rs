#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;

use clap::Parser;
use thaasbai_server::{config, logging, websocket};

/// Thaasbai -- realtime coordination server for Dhiha Ei and Digu
#[derive(Parser, Debug)]
#[command(name = "thaasbai-server")]
#[command(about = "Realtime coordination server for the Dhiha Ei and Digu card games")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config_security(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Admin endpoint: {}", cfg.admin_password.is_some());
                println!(
                    "  Reconnection grace (s): {}",
                    cfg.server.reconnect_grace_secs
                );
                println!(
                    "  Max connections per IP: {}",
                    cfg.server.max_connections_per_ip
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    logging::init_with_config(&cfg.logging);

    let port = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "starting thaasbai coordination server");

    websocket::run_server(addr, cfg).await
}
