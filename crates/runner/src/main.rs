use std::sync::Arc;
use std::time::Duration;

use aegis_runner::{Adapters, PipelineBootstrap, PipelineConfig};

fn print_help() {
    eprintln!(
        r#"aegis - signal-to-order trading pipeline (paper mode)

USAGE:
    aegis [CONFIG]

ARGS:
    CONFIG              JSON pipeline config; built-in paper setup if omitted

OPTIONS:
    --status-secs <N>   Log a status line every N seconds (default: 30)
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut status_secs: u64 = 30;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--status-secs" => {
                i += 1;
                status_secs = match args.get(i).and_then(|v| v.parse().ok()) {
                    Some(secs) => secs,
                    None => {
                        eprintln!("Error: --status-secs requires a number");
                        std::process::exit(1);
                    }
                };
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
            path => config_path = Some(path.to_string()),
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            PipelineConfig::from_file(path)?
        }
        None => {
            log::info!("Using built-in paper configuration");
            PipelineConfig::paper()
        }
    };

    let adapters = Adapters::paper(&config).await?;
    let orchestrator = Arc::new(PipelineBootstrap::build(&config, adapters)?);
    orchestrator.start().await?;

    let mut status_every = tokio::time::interval(Duration::from_secs(status_secs.max(1)));
    loop {
        tokio::select! {
            _ = status_every.tick() => {
                log::info!("[STATUS] {}", orchestrator.status().to_json());
                if orchestrator.is_halted() {
                    log::error!("Orchestrator halted, shutting down");
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    log::error!("Ctrl-C handler failed: {}", e);
                }
                log::info!("Ctrl-C received");
                break;
            }
        }
    }

    orchestrator.shutdown().await?;
    log::info!("[STATUS] {}", orchestrator.status().to_json());
    Ok(())
}
