//! Chat Report CLI - main entry point
//!
//! Generates chat-support reports from the command line or serves the upload endpoint.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use chat_report::{metrics, print_report, server, Config, ReportGenerator};

#[derive(Parser)]
#[command(name = "chat_report")]
#[command(about = "Chat-support transcript analytics and XLSX reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml (defaults to ./config.yml, then ../config.yml)
    #[arg(long, env = "CHAT_REPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long)]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report from a transcript dump
    Generate {
        /// Input file (defaults to the upload path from config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory the report is written to
        #[arg(short, long)]
        reports_dir: Option<PathBuf>,

        /// Print the tables to stdout
        #[arg(long, default_value_t = false)]
        summary: bool,

        /// Print the tables as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run the upload server
    Serve {
        /// Bind address (e.g., 127.0.0.1:5000)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("chat_report=info".parse()?))
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_file(path)?,
        None => Config::new(),
    };

    if let Some(addr) = cli.metrics_addr.as_deref().or(config.metrics_addr.as_deref()) {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    execute_command(cli.command, config).await
}

async fn execute_command(command: Commands, mut config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            input,
            reports_dir,
            summary,
            json,
        } => {
            if let Some(dir) = reports_dir {
                config.reports_dir = dir;
            }
            let input = input.unwrap_or_else(|| config.upload_path());
            let generator = ReportGenerator::from_config(&config);

            metrics::record_report_start("cli");
            let start = Instant::now();
            let result = tokio::task::spawn_blocking(move || generator.generate(&input)).await?;
            metrics::record_report_result("cli", start.elapsed(), result.is_ok());

            let outcome = result?;
            if summary {
                print_report(&outcome.tables);
                println!();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.tables)?);
            }
            println!("✅ Report generated and saved to: {}", outcome.path.display());
        }
        Commands::Serve { bind } => {
            if let Some(addr) = bind {
                config.bind_addr = addr;
            }
            server::serve(&config).await?;
        }
    }

    Ok(())
}
