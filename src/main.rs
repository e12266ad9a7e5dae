use spend_analytics::config::EngineConfig;
use spend_analytics::core::engine::{Aggregator, Dimension, MonthSelection, Predicate};
use spend_analytics::ingestion::{load_csv, Ledger};
use spend_analytics::report::{aggregate_frame, AnalysisReport};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spend-analytics")]
#[command(about = "Supplier spend analytics and month-over-month variance decomposition")]
#[command(version)]
struct Cli {
    /// Engine config JSON (or set SPEND_ANALYTICS_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: comparison, supplier summary, trends, contributions, alerts, narrative
    Report {
        /// Ledger CSV file
        csv: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Totals grouped by the given dimensions
    Aggregate {
        /// Ledger CSV file
        csv: PathBuf,

        /// Comma-separated dimensions: supplier, category, cluster, line, month
        #[arg(short, long, value_delimiter = ',', default_value = "supplier")]
        group_by: Vec<Dimension>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Emit rows as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    supplier: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    cluster: Option<String>,

    #[arg(long)]
    line: Option<String>,

    /// First month of the range (1-12)
    #[arg(long)]
    from: Option<u32>,

    /// Last month of the range (1-12)
    #[arg(long)]
    to: Option<u32>,

    /// Explicit comma-separated months; overrides --from/--to
    #[arg(long, value_delimiter = ',')]
    months: Vec<u32>,
}

impl FilterArgs {
    fn predicate(&self) -> Result<Predicate> {
        let mut predicate = Predicate::all();
        if let Some(ref s) = self.supplier {
            predicate = predicate.supplier(s.as_str());
        }
        if let Some(ref c) = self.category {
            predicate = predicate.category(c.as_str());
        }
        if let Some(ref c) = self.cluster {
            predicate = predicate.cluster(c.as_str());
        }
        if let Some(ref l) = self.line {
            predicate = predicate.line(l.as_str());
        }

        if !self.months.is_empty() {
            predicate = predicate.months(MonthSelection::set(self.months.iter().copied()));
        } else if self.from.is_some() || self.to.is_some() {
            let start = self.from.unwrap_or(1);
            let end = self.to.unwrap_or(12);
            if start > end {
                bail!("--from ({}) is after --to ({})", start, end);
            }
            predicate = predicate.month_range(start, end);
        }
        Ok(predicate)
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::resolve(cli.config.as_deref()).context("Failed to load engine config")?;

    match cli.command {
        Commands::Report { csv, filter, json } => {
            let ledger = load_ledger(&csv, &config)?;
            let report = AnalysisReport::build(&ledger.observations, &config, &filter.predicate()?);
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report.render_text()?);
            }
        }
        Commands::Aggregate { csv, group_by, filter, json } => {
            let ledger = load_ledger(&csv, &config)?;
            let rows = Aggregator::aggregate(&ledger.observations, &filter.predicate()?, &group_by);
            info!("{} aggregate rows", rows.len());
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}", aggregate_frame(&rows, &group_by)?);
            }
        }
    }

    Ok(())
}

fn load_ledger(csv: &Path, config: &EngineConfig) -> Result<Ledger> {
    let frame = load_csv(csv).with_context(|| format!("Failed to read {}", csv.display()))?;
    let ledger = Ledger::from_frame(&frame, config)?;
    info!("{} observations ready", ledger.observations.len());
    Ok(ledger)
}
