mod cli;
mod commands;
mod player;
mod render;

use anyhow::Context;
use clap::Parser;
use pods_core::config::Config;

use cli::Args;
use commands::Session;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    std::fs::create_dir_all(&config.paths.data_dir)
        .with_context(|| format!("creating {}", config.paths.data_dir.display()))?;
    init_logging(&config, args.verbose)?;

    tracing::info!("pods {} starting", env!("CARGO_PKG_VERSION"));

    let mut session = Session::open(config, std::io::stdout())?;
    session.run(args.command).await
}

fn init_logging(config: &Config, verbose: bool) -> anyhow::Result<()> {
    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper_util=warn,reqwest=warn,hyper=warn".to_string());

    if verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(log_filter.as_str())
            .init();
        return Ok(());
    }

    let log_path = config.log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();
    Ok(())
}
