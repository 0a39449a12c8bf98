use clap::Parser;
use log::{error, info};
use std::process;

use usdc_forwarder::config::AppConfig;
use usdc_forwarder::supervisor::MonitorSupervisor;

#[derive(Parser)]
#[command(name = "forwarderd", about = "Multi-network USDC deposit forwarder daemon")]
struct Args {
    /// Path to the configuration file (overrides CONFIG_FILE)
    #[arg(long)]
    config: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

#[tokio::main]
async fn main() {
    // .env is optional; real deployments use the environment directly
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    if args.print_sample_config {
        match AppConfig::generate_sample_config() {
            Ok(sample) => {
                println!("{}", sample);
                return;
            }
            Err(e) => {
                eprintln!("Failed to generate sample config: {}", e);
                process::exit(1);
            }
        }
    }

    if let Some(path) = &args.config {
        std::env::set_var("CONFIG_FILE", path);
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    usdc_forwarder::logging::init_logger(&config.logging.level, &config.logging.format);

    info!("Starting unified deposit forwarder");

    let supervisor = match MonitorSupervisor::from_config(&config) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            error!("Failed to build monitors: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = supervisor.start().await {
        error!("Failed to start monitors: {}", e);
        process::exit(1);
    }

    wait_for_shutdown().await;

    supervisor.stop();
    info!("Unified deposit forwarder stopped");
}

/// Block until SIGINT or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Unable to listen for shutdown signal: {}", e);
                } else {
                    info!("Received interrupt signal");
                }
            }
            _ = sigterm.recv() => {
                info!("Received termination signal");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", e);
        } else {
            info!("Received interrupt signal");
        }
    }
}
