use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod config;
mod criteria;
mod db;
mod error;
mod models;
mod normalize;
mod policy;
mod ranking;
mod report;
mod source;
mod telemetry;
mod weights;

use config::AppConfig;
use models::{RankedResult, RawHousehold};
use policy::RankingPolicy;
use ranking::RankingEngine;

#[derive(Parser)]
#[command(name = "bantuan-ranking")]
#[command(about = "Social-aid priority ranking for village households (SAW)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed households
    Seed,
    /// Import or update households from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank every household and print the priority list
    Rank {
        #[command(flatten)]
        source: SourceArgs,
        /// Only display households from this dusun (ranks stay global)
        #[arg(long)]
        dusun: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown priority report
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        dusun: Option<String>,
        #[arg(long, default_value = "bantuan-report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Rank households from a CSV file instead of the database
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Ranking policy JSON (defaults to BANTUAN_POLICY, then the built-in profile)
    #[arg(long)]
    policy: Option<PathBuf>,
    /// Rescale weights that do not sum to 1.0 instead of rejecting them
    #[arg(long)]
    normalize_weights: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();
    telemetry::init(&config.log_level)?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            let written = db::seed(&pool).await?;
            println!("Seeded {written} households.");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let written = db::import_csv(&pool, &csv).await?;
            println!("Imported {written} households from {}.", csv.display());
        }
        Commands::Rank {
            source,
            dusun,
            limit,
            offset,
            format,
        } => {
            let engine = build_engine(&config, &source)?;
            let households = load_households(&config, &source).await?;
            let results = engine
                .rank_raw(&households)
                .context("ranking aborted; no priority list was published")?;
            let page = report::select_page(&results, dusun.as_deref(), offset, limit);

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&page)?);
                }
                OutputFormat::Text => print_ranking(&page, results.len(), dusun.as_deref()),
            }
        }
        Commands::Report { source, dusun, out } => {
            let engine = build_engine(&config, &source)?;
            let households = load_households(&config, &source).await?;
            let results = engine
                .rank_raw(&households)
                .context("ranking aborted; no report was written")?;
            let weights = engine.weights()?;
            let report = report::build_report(
                dusun.as_deref(),
                chrono::Local::now().date_naive(),
                &weights,
                &engine.policy().polarity,
                &results,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

fn build_engine(config: &AppConfig, args: &SourceArgs) -> anyhow::Result<RankingEngine> {
    let policy = match args.policy.as_ref().or(config.policy_path.as_ref()) {
        Some(path) => RankingPolicy::load(path)
            .with_context(|| format!("failed to load ranking policy {}", path.display()))?,
        None => RankingPolicy::default(),
    };
    Ok(RankingEngine::new(policy).normalize_weights(args.normalize_weights))
}

async fn load_households(
    config: &AppConfig,
    args: &SourceArgs,
) -> anyhow::Result<Vec<RawHousehold>> {
    match &args.csv {
        Some(path) => source::read_households(path),
        None => {
            let pool = connect(config).await?;
            db::fetch_households(&pool).await
        }
    }
}

fn print_ranking(page: &[&RankedResult], total: usize, dusun: Option<&str>) {
    if page.is_empty() {
        println!("No households to display for this selection.");
        return;
    }

    match dusun {
        Some(name) => println!("Priority households in dusun {name} (of {total} ranked):"),
        None => println!("Priority households (of {total} ranked):"),
    }
    for result in page {
        println!(
            "{:>3}. {} ({}, {}) score {:.4}",
            result.rank, result.name, result.household_id, result.dusun, result.final_score
        );
    }
}
