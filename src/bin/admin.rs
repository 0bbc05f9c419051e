//! CLI administration tool for bill-news-resolver.
//!
//! Provides commands for managing the bill catalog, inspecting resolution
//! results and performing database checks without running the pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Import the 2025 bill catalog from the National Assembly API
//! cargo run --bin admin -- bills import --year 2025
//!
//! # Add a bill by hand (prompts for the title when omitted)
//! cargo run --bin admin -- bills add "Youth Protection Act" --year 2025
//!
//! # List bills and their resolved news
//! cargo run --bin admin -- bills list --year 2025
//! cargo run --bin admin -- links list --year 2025
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `BILL_API_KEY`: required by `bills import`

use bill_news_resolver::application::services::BillCatalogService;
use bill_news_resolver::config::Config;
use bill_news_resolver::domain::providers::BillSource;
use bill_news_resolver::domain::repositories::{BillRepository, LinkRepository};
use bill_news_resolver::infrastructure::clients::AssemblyBillClient;
use bill_news_resolver::infrastructure::persistence::{PgBillRepository, PgLinkRepository};
use bill_news_resolver::runner::connect_database;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing bill-news-resolver.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage the bill catalog
    Bills {
        #[command(subcommand)]
        action: BillAction,
    },

    /// Inspect resolution results
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Bill catalog subcommands.
#[derive(Subcommand)]
enum BillAction {
    /// Import bills proposed in a year from the bill API
    Import {
        #[arg(short, long)]
        year: Option<i32>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Add a single bill
    Add {
        /// Bill title (prompted when omitted)
        title: Option<String>,

        #[arg(short, long)]
        year: Option<i32>,
    },

    /// List stored bills
    List {
        #[arg(short, long)]
        year: Option<i32>,
    },
}

/// Resolution result subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// List resolved news per bill
    List {
        #[arg(short, long)]
        year: Option<i32>,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;
    let pool = connect_database(&config, &database_url).await?;

    match cli.command {
        Commands::Bills { action } => handle_bill_action(action, &config, &pool).await?,
        Commands::Links { action } => handle_link_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Dispatches bill catalog commands.
async fn handle_bill_action(action: BillAction, config: &Config, pool: &PgPool) -> Result<()> {
    let repo = Arc::new(PgBillRepository::new(Arc::new(pool.clone())));

    match action {
        BillAction::Import { year, yes } => {
            import_bills(repo, config, year.unwrap_or_else(current_year), yes).await?;
        }
        BillAction::Add { title, year } => {
            add_bill(repo, title, year.unwrap_or_else(current_year)).await?;
        }
        BillAction::List { year } => {
            list_bills(repo, year.unwrap_or_else(current_year)).await?;
        }
    }

    Ok(())
}

/// Imports a year's bills from the National Assembly API.
///
/// Bills already stored are left untouched.
async fn import_bills(
    repo: Arc<PgBillRepository>,
    config: &Config,
    year: i32,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "📥 Import Bills".bright_blue().bold());
    println!();

    let key = config
        .bill_api_key
        .as_deref()
        .context("BILL_API_KEY must be set to import bills")?;
    let client = AssemblyBillClient::new(&config.bill_api_url, Some(key), config.http_timeout)
        .context("Failed to build bill API client")?;
    let source: Arc<dyn BillSource> = Arc::new(client);

    println!("  Year:   {}", year.to_string().cyan());
    println!("  Source: {}", config.bill_api_url.bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Fetch and store these bills?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let before = repo
        .count(Some(year))
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let catalog = BillCatalogService::new(Arc::clone(&repo), Some(source));
    let bills = catalog
        .import(year)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to import bills: {}", e))?;

    let after = repo
        .count(Some(year))
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!();
    println!("{}", "✅ Import finished".green().bold());
    println!("  Fetched:  {}", bills.len().to_string().bright_white().bold());
    println!("  New:      {}", (after - before).to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn add_bill(repo: Arc<PgBillRepository>, title: Option<String>, year: i32) -> Result<()> {
    println!("{}", "➕ Add Bill".bright_blue().bold());
    println!();

    let title = match title {
        Some(t) => t,
        None => Input::new().with_prompt("Bill title").interact_text()?,
    };

    let catalog = BillCatalogService::new(repo, None);
    let bill = catalog
        .add(year, &title)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add bill: {}", e))?;

    println!("{}", "✅ Bill stored".green().bold());
    println!("  ID:    {}", bill.id.to_string().bright_black());
    println!("  Year:  {}", bill.year.to_string().cyan());
    println!("  Title: {}", bill.title.bright_white());
    println!();

    Ok(())
}

/// Lists the stored bills of a year.
///
/// # Output Format
///
/// ```text
/// 📋 Bills (2025)
///
///   ID    Proposed     Title
///   ──────────────────────────────────────────────────────
///   12    2025-03-04   청소년 보호법 일부개정법률안
/// ```
async fn list_bills(repo: Arc<PgBillRepository>, year: i32) -> Result<()> {
    println!("{}", format!("📋 Bills ({year})").bright_blue().bold());
    println!();

    let bills = repo
        .list_by_year(year)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list bills: {}", e))?;

    if bills.is_empty() {
        println!("{}", "  No bills found".yellow());
        println!();
        println!(
            "  Import them with: {} admin bills import --year {year}",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<5} {:<12} {}",
        "ID".bright_white().bold(),
        "Proposed".bright_white().bold(),
        "Title".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for bill in &bills {
        let proposed = bill
            .propose_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<5} {:<12} {}",
            bill.id.to_string().bright_black(),
            proposed.bright_black(),
            bill.title.cyan()
        );
    }

    println!();
    println!("  Total: {}", bills.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Dispatches resolution result commands.
async fn handle_link_action(action: LinkAction, pool: &PgPool) -> Result<()> {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    match action {
        LinkAction::List { year } => {
            let year = year.unwrap_or_else(current_year);
            println!("{}", format!("📰 Resolved News ({year})").bright_blue().bold());
            println!();

            let rows = repo
                .list_by_year(year)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

            if rows.is_empty() {
                println!("{}", "  No results yet".yellow());
                return Ok(());
            }

            for (bill, link) in &rows {
                println!("  {}", bill.title.bright_white().bold());
                if link.is_no_match() {
                    println!("    {}", link.news_title.bright_black());
                } else {
                    let body = if link.body.is_some() {
                        "body".green()
                    } else {
                        "no body".yellow()
                    };
                    println!("    {}", link.news_title.cyan());
                    println!(
                        "    {}  comments={} similarity={:.3} [{}]",
                        link.news_url.bright_black(),
                        link.comment_count.to_string().bright_green(),
                        link.similarity,
                        body
                    );
                }
            }

            println!();
            println!("  Total: {}", rows.len().to_string().bright_white().bold());
            println!();
        }
    }

    Ok(())
}

/// Displays catalog and resolution statistics.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let pool = Arc::new(pool.clone());
    let bills = PgBillRepository::new(Arc::clone(&pool))
        .count(None)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;
    let counts = PgLinkRepository::new(pool)
        .counts()
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!("  Bills:          {}", bills.to_string().bright_green().bold());
    println!("  Matched:        {}", counts.matched.to_string().bright_green().bold());
    println!("  No match:       {}", counts.no_match.to_string().bright_green().bold());
    println!(
        "  Unresolved:     {}",
        (bills - counts.matched - counts.no_match)
            .max(0)
            .to_string()
            .bright_green()
            .bold()
    );
    println!("  Bodies stored:  {}", counts.with_body.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
