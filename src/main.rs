mod loader;
mod output;

use analytics::{AnalyticsEngine, PerformanceReport};
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use configuration::{Config, SettingsOverrides, SimulationSettings, init_logging, load_config};
use core_types::FirstPeriodPolicy;
use indicatif::{ProgressBar, ProgressStyle};
use portfolio_backtester::{
    BacktestJob, BacktestSimulator, DriftReport, ReturnSeriesBuilder, run_batch,
};
use std::path::PathBuf;

/// The main entry point for the Wallet backtesting application.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.command.overrides().apply(&mut config);
    config.validate().context("Invalid settings")?;

    // Held until exit so the file appender flushes.
    let _guard = init_logging(&config.logging)?;

    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config),
        Commands::Compare(args) => handle_compare(args, &config),
        Commands::Drift(args) => handle_drift(args, &config),
        Commands::Stats(args) => handle_stats(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Portfolio rebalancing backtester.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the portfolio and print its performance metrics.
    Backtest(BacktestArgs),
    /// Run the rebalanced and buy-and-hold portfolios side by side.
    Compare(CompareArgs),
    /// Report how far a target-weight portfolio has drifted recently.
    Drift(DriftArgs),
    /// Annualized return and volatility per asset, and their correlations.
    Stats(StatsArgs),
}

impl Commands {
    fn overrides(&self) -> &SettingsOverrides {
        match self {
            Commands::Backtest(args) => &args.overrides,
            Commands::Compare(args) => &args.overrides,
            Commands::Drift(args) => &args.overrides,
            Commands::Stats(args) => &args.overrides,
        }
    }
}

#[derive(Args)]
struct DataArgs {
    /// CSV of prices: a `date` column followed by one column per asset.
    #[arg(long)]
    prices: PathBuf,

    /// CSV of target weights: `asset,weight` rows.
    #[arg(long)]
    weights: PathBuf,

    /// Forward-fill, then back-fill missing prices before simulating.
    #[arg(long)]
    fill_gaps: bool,
}

#[derive(Args)]
struct BacktestArgs {
    #[command(flatten)]
    data: DataArgs,

    /// CSV of a benchmark series (`date,value`) for relative metrics.
    #[arg(long)]
    benchmark: Option<PathBuf>,

    /// Write the equity curve to this CSV file.
    #[arg(long)]
    equity_out: Option<PathBuf>,

    /// Write the rebalance log to this CSV file.
    #[arg(long)]
    log_out: Option<PathBuf>,

    /// Write the performance report to this JSON file.
    #[arg(long)]
    json_out: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingsOverrides,
}

#[derive(Args)]
struct CompareArgs {
    #[command(flatten)]
    data: DataArgs,

    /// CSV of a benchmark series (`date,value`) for relative metrics.
    #[arg(long)]
    benchmark: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingsOverrides,
}

#[derive(Args)]
struct DriftArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Look-back window in calendar days.
    #[arg(long, default_value_t = 90)]
    window_days: i64,

    #[command(flatten)]
    overrides: SettingsOverrides,
}

#[derive(Args)]
struct StatsArgs {
    /// CSV of prices: a `date` column followed by one column per asset.
    #[arg(long)]
    prices: PathBuf,

    /// Forward-fill, then back-fill missing prices first.
    #[arg(long)]
    fill_gaps: bool,

    #[command(flatten)]
    overrides: SettingsOverrides,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs, config: &Config) -> Result<()> {
    let prices = loader::load_prices(&args.data.prices, args.data.fill_gaps)?;
    let weights = loader::load_weights(&args.data.weights)?;
    let benchmark = args
        .benchmark
        .as_deref()
        .map(loader::load_benchmark)
        .transpose()?;

    let simulator = BacktestSimulator::new(config.simulation.clone())?;
    let result = simulator.run(&prices, &weights)?;

    let engine = AnalyticsEngine::new(config.metrics.clone())?;
    let report = engine.calculate(&result.equity_curve, benchmark.as_ref())?;

    println!("{}", output::metrics_table(&report));
    println!(
        "{} to {}: {} observations, {} rebalance(s)",
        report.start,
        report.end,
        report.observations,
        result.rebalance_log.len()
    );

    if let Some(path) = &args.equity_out {
        output::write_equity_curve(&result.equity_curve, output::create(path)?)?;
        println!("Equity curve written to {}", path.display());
    }
    if let Some(path) = &args.log_out {
        let assets: Vec<&str> = weights.assets().collect();
        output::write_rebalance_log(&result.rebalance_log, &assets, output::create(path)?)?;
        println!("Rebalance log written to {}", path.display());
    }
    if let Some(path) = &args.json_out {
        output::write_json_report(&report, path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn handle_compare(args: CompareArgs, config: &Config) -> Result<()> {
    let prices = loader::load_prices(&args.data.prices, args.data.fill_gaps)?;
    let weights = loader::load_weights(&args.data.weights)?;
    let benchmark = args
        .benchmark
        .as_deref()
        .map(loader::load_benchmark)
        .transpose()?;

    let jobs = vec![
        BacktestJob {
            name: "Rebalanced".to_string(),
            prices: &prices,
            weights: weights.clone(),
            settings: SimulationSettings {
                rebalance_enabled: true,
                ..config.simulation.clone()
            },
        },
        BacktestJob {
            name: "Buy & Hold".to_string(),
            prices: &prices,
            weights: weights.clone(),
            settings: SimulationSettings {
                rebalance_enabled: false,
                ..config.simulation.clone()
            },
        },
    ];

    let progress_bar = ProgressBar::new(jobs.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    let outcomes = run_batch(&jobs, |_| progress_bar.inc(1));
    progress_bar.finish_and_clear();

    let engine = AnalyticsEngine::new(config.metrics.clone())?;
    let mut reports: Vec<(String, PerformanceReport)> = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(result) => {
                let report = engine
                    .calculate(&result.equity_curve, benchmark.as_ref())
                    .with_context(|| format!("metrics for {}", outcome.name))?;
                println!("{}: {} rebalance(s)", outcome.name, result.rebalance_log.len());
                reports.push((outcome.name, report));
            }
            Err(e) => eprintln!("{} failed: {}", outcome.name, e),
        }
    }

    if reports.is_empty() {
        bail!("every simulation failed");
    }
    println!("{}", output::comparison_table(&reports));
    Ok(())
}

fn handle_drift(args: DriftArgs, config: &Config) -> Result<()> {
    if args.window_days <= 0 {
        bail!("--window-days must be positive, got {}", args.window_days);
    }
    let prices = loader::load_prices(&args.data.prices, args.data.fill_gaps)?;
    let weights = loader::load_weights(&args.data.weights)?;

    let report = DriftReport::from_prices(
        &prices,
        &weights,
        args.window_days,
        config.simulation.drift_threshold,
        config.simulation.drift_mode,
    )?;

    println!("{}", output::drift_table(&report));
    let verdict = if report.breached() {
        "rebalance recommended"
    } else {
        "within tolerance"
    };
    println!(
        "Max |drift| {:.4} ({} mode, threshold {:.4}): {}",
        report.max_abs_drift, report.mode, report.threshold, verdict
    );
    Ok(())
}

fn handle_stats(args: StatsArgs, config: &Config) -> Result<()> {
    let prices = loader::load_prices(&args.prices, args.fill_gaps)?;
    let returns = ReturnSeriesBuilder::new(FirstPeriodPolicy::Drop)
        .build(&prices, prices.assets())
        .context("Failed to compute asset returns")?;

    let periods_per_year = config.metrics.periods_per_year;
    println!("{}", output::asset_stats_table(&returns.asset_stats(periods_per_year)));
    println!("{}", output::correlation_table(&returns.correlation()));
    println!(
        "{} return periods, annualized with {} periods per year",
        returns.len(),
        periods_per_year
    );
    Ok(())
}
