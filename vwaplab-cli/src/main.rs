//! VWAPLab CLI: run, indicators and synth commands.
//!
//! Commands:
//! - `run`: replay a VWAP strategy from TOML config file(s) or flags
//! - `indicators`: print aggregated bars with session VWAP and ATR as CSV
//! - `synth`: print seeded synthetic 1-minute bars as CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vwaplab_core::indicators::{annotate, PriceMode};
use vwaplab_runner::config::RunConfig;
use vwaplab_runner::data_loader::{load_bars, slice_sessions};
use vwaplab_runner::export::{export_json, save_artifacts, write_annotated_csv, write_bars_csv};
use vwaplab_runner::{
    generate_minute_bars, run_batch, run_single, RunReport, StrategyVariant, SyntheticConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "vwaplab",
    about = "VWAPLab CLI: session VWAP/ATR indicators and VWAP decision machines"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a strategy over 1-minute CSV data and print a summary.
    Run {
        /// TOML config file(s). More than one runs them as a parallel batch.
        /// Mutually exclusive with the run flags below.
        #[arg(long, num_args = 1.., conflicts_with = "run_flags")]
        config: Vec<PathBuf>,

        #[command(flatten)]
        flags: RunFlags,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write report.json, trades.csv and equity.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print aggregated bars annotated with session VWAP and ATR as CSV.
    Indicators {
        /// TOML config file. Mutually exclusive with the run flags below.
        #[arg(long, conflicts_with = "run_flags")]
        config: Option<PathBuf>,

        #[command(flatten)]
        flags: RunFlags,
    },
    /// Print seeded synthetic 1-minute bars as CSV.
    Synth {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of weekday sessions.
        #[arg(long, default_value_t = 5)]
        days: usize,

        /// First session date (YYYY-MM-DD).
        #[arg(long, default_value = "2025-01-02")]
        start: String,

        #[arg(long, default_value_t = 100.0)]
        price: f64,

        /// Maximum absolute per-minute return.
        #[arg(long, default_value_t = 0.0015)]
        max_step: f64,
    },
}

/// Config built from flags when no config file is given.
///
/// Every flag is optional so that clap can reject any of them next to
/// `--config`; unset flags take the `RunConfig` defaults.
#[derive(Args, Debug)]
#[group(id = "run_flags", multiple = true)]
struct RunFlags {
    /// 1-minute CSV file.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Strategy: long_bracket or short_reversal [default: long_bracket].
    #[arg(long)]
    variant: Option<StrategyVariant>,

    /// [default: SPY]
    #[arg(long)]
    symbol: Option<String>,

    /// Exchange timezone (IANA name) [default: America/New_York].
    #[arg(long)]
    timezone: Option<String>,

    /// First session to evaluate (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// Last session to evaluate (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// [default: 100000]
    #[arg(long)]
    capital: Option<f64>,

    /// Aggregation width in minutes [default: 15].
    #[arg(long)]
    interval: Option<u32>,

    /// [default: 14]
    #[arg(long)]
    atr_period: Option<usize>,

    /// Stop-loss distance in ATR multiples, long_bracket only [default: 1.0].
    #[arg(long)]
    stop_atr: Option<f64>,

    /// Take-profit distance in ATR multiples, long_bracket only [default: 1.5].
    #[arg(long)]
    target_atr: Option<f64>,

    /// VWAP price: close or typical. Defaults per strategy.
    #[arg(long)]
    price_mode: Option<PriceMode>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            flags,
            json,
            output_dir,
        } => run_cmd(config, flags, json, output_dir),
        Commands::Indicators { config, flags } => indicators_cmd(config, flags),
        Commands::Synth {
            seed,
            days,
            start,
            price,
            max_step,
        } => synth_cmd(seed, days, &start, price, max_step),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_date(raw: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid {flag} date '{s}' (expected YYYY-MM-DD)"))
    })
    .transpose()
}

fn config_from_flags(flags: RunFlags) -> Result<RunConfig> {
    let Some(data) = flags.data else {
        bail!("one of --config or --data is required");
    };
    let mut config = RunConfig::for_path(data);
    if let Some(symbol) = flags.symbol {
        config.data.symbol = symbol;
    }
    if let Some(timezone) = flags.timezone {
        config.data.timezone = timezone;
    }
    config.data.start_date = parse_date(flags.start.as_deref(), "--start")?;
    config.data.end_date = parse_date(flags.end.as_deref(), "--end")?;
    if let Some(interval) = flags.interval {
        config.aggregation.interval_minutes = interval;
    }
    if let Some(atr_period) = flags.atr_period {
        config.indicators.atr_period = atr_period;
    }
    if let Some(variant) = flags.variant {
        config.strategy.variant = variant;
    }
    config.strategy.price_mode = flags.price_mode;
    if let Some(stop_atr) = flags.stop_atr {
        config.strategy.stop_loss_atr = stop_atr;
    }
    if let Some(target_atr) = flags.target_atr {
        config.strategy.take_profit_atr = target_atr;
    }
    if let Some(capital) = flags.capital {
        config.backtest.initial_capital = capital;
    }
    config.validate()?;
    Ok(config)
}

fn load_configs(paths: Vec<PathBuf>, flags: RunFlags) -> Result<Vec<RunConfig>> {
    if paths.is_empty() {
        return Ok(vec![config_from_flags(flags)?]);
    }
    paths
        .iter()
        .map(|p| {
            RunConfig::from_file(p).with_context(|| format!("failed to load {}", p.display()))
        })
        .collect()
}

fn run_cmd(
    config_paths: Vec<PathBuf>,
    flags: RunFlags,
    json: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let configs = load_configs(config_paths, flags)?;

    let reports: Vec<RunReport> = if configs.len() == 1 {
        vec![run_single(&configs[0])?]
    } else {
        let mut reports = Vec::with_capacity(configs.len());
        let mut failures = 0usize;
        for (config, result) in configs.iter().zip(run_batch(&configs)) {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    failures += 1;
                    eprintln!("Error for {}: {err}", config.data.path.display());
                }
            }
        }
        if failures > 0 {
            bail!("{failures} of {} runs failed", configs.len());
        }
        reports
    };

    for report in &reports {
        if json {
            println!("{}", export_json(report)?);
        } else {
            print_summary(report);
        }
        if let Some(dir) = &output_dir {
            let run_dir = save_artifacts(report, dir)?;
            info!(dir = %run_dir.display(), "saved artifacts");
            if !json {
                println!("Artifacts saved to: {}", run_dir.display());
            }
        }
    }
    Ok(())
}

fn indicators_cmd(config_path: Option<PathBuf>, flags: RunFlags) -> Result<()> {
    let config = match config_path {
        Some(path) => RunConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => config_from_flags(flags)?,
    };
    let loaded = load_bars(&config)?;
    let annotated = annotate(&loaded.bars, config.indicator_spec());
    let bars = slice_sessions(&annotated, &config.data);
    write_annotated_csv(&bars, io::stdout().lock())
}

fn synth_cmd(seed: u64, days: usize, start: &str, price: f64, max_step: f64) -> Result<()> {
    if !(price.is_finite() && price > 0.0) {
        bail!("--price must be a positive number, got {price}");
    }
    if !(max_step.is_finite() && max_step >= 0.0) {
        bail!("--max-step must be >= 0, got {max_step}");
    }
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start date '{start}' (expected YYYY-MM-DD)"))?;
    let bars = generate_minute_bars(&SyntheticConfig {
        seed,
        start,
        days,
        start_price: price,
        max_step,
    });
    write_bars_csv(&bars, io::stdout().lock())
}

fn print_summary(report: &RunReport) {
    let m = &report.metrics;
    println!();
    println!("=== VWAP Run ===");
    println!("Symbol:         {}", report.symbol);
    println!("Strategy:       {}", report.strategy);
    match (&report.first_session, &report.last_session) {
        (Some(first), Some(last)) => println!("Sessions:       {first} to {last}"),
        _ => println!("Sessions:       none in range"),
    }
    println!(
        "Bars:           {} ({} raw records)",
        report.bar_count, report.raw_count
    );
    println!("Trades:         {}", m.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Total Return:   {:.2}%", m.total_return_pct);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown_pct);
    println!("Exposure:       {:.1}%", m.exposure_pct);
    println!("Win Rate:       {:.1}%", m.win_rate_pct);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg Trade:      {:.3}%", m.avg_trade_pct);
    println!("Best / Worst:   {:.3}% / {:.3}%", m.best_trade_pct, m.worst_trade_pct);
    if !m.exits.is_empty() {
        println!();
        println!("--- Exits ---");
        for (reason, count) in &m.exits {
            println!("{reason:<16}{count}");
        }
    }
    let run_id: String = report.run_id.chars().take(12).collect();
    println!("Run ID:         {run_id}");
    println!();
}
