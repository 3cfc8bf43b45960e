//! symcheck CLI: run the API daemon or use the analysis pipeline directly.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use symcheck_kernel::SymcheckKernel;
use symcheck_types::config::{load_config, SymcheckConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "symcheck", version, about = "Healthcare symptom checker service")]
struct Cli {
    /// Path to config.toml (defaults to ~/.symcheck/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API daemon.
    Start {
        /// Override the listen address from config.
        #[arg(long)]
        listen: Option<String>,
    },
    /// Analyze symptoms once, record the result, and print it.
    Analyze {
        /// Free-text symptom description.
        text: String,
    },
    /// Print stored analysis history.
    History {
        /// Only show entries whose symptoms or result contain this keyword.
        #[arg(long)]
        keyword: Option<String>,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn init_tracing(config: &SymcheckConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config, cli.json_logs);
    tracing::debug!(home = %config.home_dir.display(), "Configuration loaded");

    match cli.command {
        Command::Start { listen } => {
            if let Some(listen) = listen {
                config.api_listen = listen;
            }
            let addr = config.listen_addr()?;
            let kernel = Arc::new(
                SymcheckKernel::boot_with_config(config).context("Failed to boot kernel")?,
            );
            symcheck_api::server::run_daemon(kernel, addr)
                .await
                .context("API server failed")?;
        }
        Command::Analyze { text } => {
            let kernel =
                SymcheckKernel::boot_with_config(config).context("Failed to boot kernel")?;
            let recorded = kernel.analyze_and_record(&text).await?;
            if recorded.outcome.degraded {
                eprintln!("warning: no model responded; showing fallback message");
            } else {
                eprintln!("model: {}", recorded.outcome.model_used);
            }
            println!("{}", recorded.outcome.text);
        }
        Command::History { keyword, json } => {
            // Listing needs no credential, so open the store directly.
            let store = symcheck_kernel::open_history(&config)?;
            let records = store.list(keyword.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No history entries.");
            } else {
                for r in records {
                    println!(
                        "#{} [{}] {}",
                        r.id,
                        r.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                        r.model_used
                    );
                    println!("  symptoms: {}", r.symptoms);
                    println!(
                        "  result:   {}",
                        r.result.lines().next().unwrap_or_default()
                    );
                }
            }
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
