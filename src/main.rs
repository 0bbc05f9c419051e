use bill_news_resolver::config::{Config, parse_years};
use bill_news_resolver::domain::progress::StopSignal;
use bill_news_resolver::runner::{RunOptions, run};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Resolves legislative bills to their most-discussed news article.
#[derive(Parser)]
#[command(name = "bill-news-resolver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Years to resolve: `2025`, `2024-2026` or `2023,2025` (overrides RESOLVER_YEARS)
    #[arg(long)]
    years: Option<String>,

    /// Keep results in memory instead of writing to the database
    #[arg(long)]
    dry_run: bool,

    /// Skip article body collection after resolution
    #[arg(long)]
    skip_bodies: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&config)?;

    config.validate()?;
    config.print_summary();

    let years = match cli.years {
        Some(ref raw) => parse_years(raw).context("Invalid --years")?,
        None => Vec::new(),
    };

    let stop = StopSignal::new();
    let on_signal = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, finishing in-flight work");
            on_signal.stop();
        }
    });

    let options = RunOptions {
        years,
        dry_run: cli.dry_run,
        skip_bodies: cli.skip_bodies,
    };

    run(config, options, stop).await
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid RUST_LOG '{}'", config.log_level))?;

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
