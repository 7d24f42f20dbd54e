//! Reverse decay command line.
//!
//! # Usage
//!
//! ```bash
//! # Price an ATM straddle and optionally invert an observed premium
//! reverse-decay price --spot 22000 --strike 22000 --days 7 --vol 0.14 --premium 420
//!
//! # Assess the latest point of a scored series (or raw ticks with --ticks)
//! reverse-decay assess series.json
//!
//! # Backtest on a bar file, or on a seeded synthetic market
//! reverse-decay backtest --bars bars.json --from 2024-01-01 --to 2024-06-30
//! reverse-decay backtest --seed 7 --days 120 --strategy combined
//!
//! # Emit a synthetic intraday series
//! reverse-decay simulate --samples 75 --seed 7
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use reverse_decay::backtest::{BacktestEngine, BacktestParams, Strategy, TimeFrame};
use reverse_decay::data::{DecaySeries, HistoricalBar, SyntheticMarket, TickSample};
use reverse_decay::scoring::{AnchorVol, RiskAssessment};
use reverse_decay::AppConfig;

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "reverse-decay")]
#[command(about = "Straddle reverse decay scoring and backtesting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a straddle and solve implied volatility
    Price {
        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// Calendar days to expiry
        #[arg(long)]
        days: f64,

        /// Volatility used for pricing
        #[arg(long, default_value_t = 0.15)]
        vol: f64,

        /// Observed straddle premium to invert
        #[arg(long)]
        premium: Option<f64>,
    },

    /// Assess the latest point of a series
    Assess {
        /// JSON array of scored points
        series: PathBuf,

        /// Treat the file as raw tick samples and score them first
        #[arg(long)]
        ticks: bool,

        /// Fixed anchor volatility for tick scoring (defaults to first tick IV)
        #[arg(long)]
        anchor_vol: Option<f64>,
    },

    /// Run a threshold backtest
    Backtest {
        /// JSON array of historical bars; omit to use a synthetic market
        #[arg(long)]
        bars: Option<PathBuf>,

        #[arg(long, default_value = "NIFTY")]
        symbol: String,

        /// Start date (YYYY-MM-DD); defaults to the first bar
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD); defaults to the last bar
        #[arg(long)]
        to: Option<String>,

        /// reverseDecay, ivSpike or combined
        #[arg(long, default_value = "reverseDecay", value_parser = parse_strategy)]
        strategy: Strategy,

        #[arg(long, default_value_t = 0.05)]
        entry: f64,

        #[arg(long, default_value_t = 0.02)]
        exit: f64,

        /// Stop loss in percent of entry premium
        #[arg(long, default_value_t = 20.0)]
        stop_loss: f64,

        /// Profit target in percent of entry premium
        #[arg(long, default_value_t = 40.0)]
        target: f64,

        /// Seed for the synthetic market
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Synthetic trading days
        #[arg(long, default_value_t = 120)]
        days: usize,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic intraday decay series as JSON
    Simulate {
        #[arg(long, default_value_t = 75)]
        samples: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown strategy '{s}' (reverseDecay, ivSpike, combined)"))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date '{s}'"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reverse_decay=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Price {
            spot,
            strike,
            days,
            vol,
            premium,
        } => cmd_price(&config, spot, strike, days / 365.0, vol, premium)?,
        Commands::Assess {
            series,
            ticks,
            anchor_vol,
        } => cmd_assess(&config, &series, ticks, anchor_vol)?,
        Commands::Backtest {
            bars,
            symbol,
            from,
            to,
            strategy,
            entry,
            exit,
            stop_loss,
            target,
            seed,
            days,
            json,
        } => {
            let bars = match bars {
                Some(path) => read_json::<Vec<HistoricalBar>>(&path)?,
                None => {
                    info!(seed, days, "generating synthetic bars");
                    let start = match &from {
                        Some(s) => parse_date(s)?,
                        None => NaiveDate::from_ymd_opt(2024, 1, 1).context("Invalid start")?,
                    };
                    SyntheticMarket::new(config.synthetic.clone())?.historical_bars(
                        start,
                        days,
                        &mut StdRng::seed_from_u64(seed),
                    )?
                }
            };

            let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
                bail!("No bars to backtest");
            };
            let params = BacktestParams {
                symbol,
                from_date: from.as_deref().map(parse_date).transpose()?.unwrap_or(first.date),
                to_date: to.as_deref().map(parse_date).transpose()?.unwrap_or(last.date),
                time_frame: TimeFrame::OneDay,
                strategy,
                entry_threshold: entry,
                exit_threshold: exit,
                stop_loss,
                target_profit: target,
            };
            cmd_backtest(&config, &params, &bars, json)?;
        }
        Commands::Simulate { samples, seed } => {
            let series = SyntheticMarket::new(config.synthetic.clone())?
                .decay_series(samples, &mut StdRng::seed_from_u64(seed))?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
    }

    Ok(())
}

fn cmd_price(
    config: &AppConfig,
    spot: f64,
    strike: f64,
    time: f64,
    vol: f64,
    premium: Option<f64>,
) -> Result<()> {
    let bs = config.pricing;

    println!("{}", SEPARATOR);
    println!("Straddle @ spot {spot}, strike {strike}, T = {time:.4}y, vol {vol:.4}");
    println!("{}", SEPARATOR);
    println!("  Call:     {:.2}", bs.call_price(spot, strike, time, vol)?);
    println!("  Put:      {:.2}", bs.put_price(spot, strike, time, vol)?);
    println!("  Straddle: {:.2}", bs.straddle_price(spot, strike, time, vol)?);
    println!("  Vega:     {:.4}", bs.straddle_vega(spot, strike, time, vol)?);

    if let Some(observed) = premium {
        let solution = config.iv_solver().solve(observed, spot, strike, time)?;
        println!(
            "  IV:       {:.4} (converged: {}, iterations: {})",
            solution.volatility, solution.converged, solution.iterations
        );
    }
    Ok(())
}

fn cmd_assess(
    config: &AppConfig,
    path: &PathBuf,
    ticks: bool,
    anchor_vol: Option<f64>,
) -> Result<()> {
    let series: DecaySeries = if ticks {
        let samples: Vec<TickSample> = read_json(path)?;
        let anchor = anchor_vol.map_or(AnchorVol::FirstTick, AnchorVol::Fixed);
        config.series_builder(anchor).build(&samples)?
    } else {
        read_json(path)?
    };

    let Some(assessment) = RiskAssessment::from_series(&series, &config.scorer) else {
        bail!("Series in {} is empty", path.display());
    };
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn cmd_backtest(
    config: &AppConfig,
    params: &BacktestParams,
    bars: &[HistoricalBar],
    json: bool,
) -> Result<()> {
    let mut engine = BacktestEngine::new(config.backtest.clone(), config.scorer.clone());
    let result = engine.run(params, bars)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", SEPARATOR);
    println!(
        "{} {} {} -> {}",
        params.symbol,
        params.strategy.name(),
        params.from_date,
        params.to_date
    );
    println!("{}", SEPARATOR);
    for trade in &result.trades {
        println!(
            "  {} -> {} ({:>2}d) {:>10.2} -> {:>10.2}  {:>9.2}  {}",
            trade.entry_date,
            trade.exit_date,
            trade.duration,
            trade.entry_price,
            trade.exit_price,
            trade.pnl,
            trade.exit_reason.as_str()
        );
    }
    if !result.trades.is_empty() {
        println!();
    }
    println!("{}", result.summary.report());
    Ok(())
}
