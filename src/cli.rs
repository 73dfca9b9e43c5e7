//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_DATE_FORMAT};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    optional_double, optional_int, parse_optional_date, validate_backtest_config,
    validate_data_config, validate_seasonality_config, validate_strategy_config,
};
use crate::domain::error::SeasontraderError;
use crate::domain::metrics::MetricResult;
use crate::domain::observation::{self, Observation};
use crate::domain::seasonality::{self, ExtremeMonthCounts, MONTH_NAMES, SeasonalityReport};
use crate::domain::signal::MonthlySignal;
use crate::domain::stop_loss::{DEFAULT_LAG, StopLossOverlay};
use crate::domain::strategy::{Preset, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "seasontrader",
    about = "Seasonal currency strategy backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        /// Use a reference strategy (a, b or c) instead of the configured one
        #[arg(short, long)]
        preset: Option<Preset>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the three reference strategies over the same data
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rank calendar months by extreme window returns
    Seasonality {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            preset,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, strategy.as_ref(), preset)
            } else {
                run_backtest(&config, strategy.as_ref(), preset, output.as_ref())
            }
        }
        Command::Compare { config, output } => run_compare(&config, output.as_ref()),
        Command::Seasonality { config } => run_seasonality(&config),
        Command::Validate { strategy } => run_validate(&strategy),
    }
}

fn fail(err: &SeasontraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
) -> Result<BacktestConfig, SeasontraderError> {
    let span_years = optional_double(adapter, "backtest", "span_years")?;

    Ok(BacktestConfig {
        start_date: parse_optional_date(adapter, "start_date")?,
        end_date: parse_optional_date(adapter, "end_date")?,
        span_years,
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, SeasontraderError> {
    let name = adapter
        .get_string("strategy", "name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Seasonal strategy".to_string());

    let signal = match adapter
        .get_string("strategy", "months")
        .filter(|s| !s.trim().is_empty())
    {
        Some(months) => MonthlySignal::parse(name.clone(), &months)?,
        None => MonthlySignal::short_march_long_late_summer(),
    };

    let mut strategy = Strategy::new(name, signal);

    if let Some(threshold) = optional_double(adapter, "strategy", "stop_loss")? {
        let lag = match optional_int(adapter, "strategy", "stop_loss_lag")? {
            None => DEFAULT_LAG,
            Some(lag) => usize::try_from(lag).map_err(|_| SeasontraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "stop_loss_lag".into(),
                reason: "stop_loss_lag must be at least 1".into(),
            })?,
        };
        strategy = strategy.with_stop_loss(StopLossOverlay::new(threshold, lag)?);
    }

    Ok(strategy)
}

/// Window length for the seasonality scan, defaulting when `[seasonality]
/// has no `window`.
pub fn build_seasonality_window(adapter: &dyn ConfigPort) -> Result<usize, SeasontraderError> {
    match optional_int(adapter, "seasonality", "window")? {
        None => Ok(seasonality::DEFAULT_WINDOW),
        Some(window) => usize::try_from(window)
            .ok()
            .filter(|w| *w >= 1)
            .ok_or_else(|| SeasontraderError::ConfigInvalid {
                section: "seasonality".into(),
                key: "window".into(),
                reason: "window must be at least 1".into(),
            }),
    }
}

/// CSV adapter rooted at the config file's directory so relative paths in
/// `[data]` resolve the same way regardless of the working directory.
pub fn build_data_adapter(adapter: &FileConfigAdapter) -> CsvAdapter {
    let base = adapter
        .base_dir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let date_format = adapter
        .get_string("data", "date_format")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
    CsvAdapter::new(base).with_date_format(date_format)
}

fn prices_series(adapter: &dyn ConfigPort) -> Result<String, SeasontraderError> {
    adapter
        .get_string("data", "prices")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SeasontraderError::ConfigMissing {
            section: "data".into(),
            key: "prices".into(),
        })
}

/// Strategy precedence: `--preset`, then `--strategy` file, then the
/// `[strategy]` section of the main config.
fn resolve_strategy(
    adapter: &FileConfigAdapter,
    strategy_path: Option<&PathBuf>,
    preset: Option<Preset>,
) -> Result<Strategy, ExitCode> {
    if let Some(preset) = preset {
        return Ok(Strategy::preset(preset));
    }

    let strategy_adapter = match strategy_path {
        Some(path) => Some(load_config(path)?),
        None => None,
    };
    let strategy_config: &dyn ConfigPort = strategy_adapter.as_ref().unwrap_or(adapter);

    validate_strategy_config(strategy_config).map_err(|e| fail(&e))?;
    build_strategy(strategy_config).map_err(|e| fail(&e))
}

/// Loads the price series once and runs every strategy over it.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    prices: &str,
    strategies: &[Strategy],
    bt_config: &BacktestConfig,
) -> Result<Vec<BacktestResult>, SeasontraderError> {
    let observations =
        data_port.fetch_observations(prices, bt_config.start_date, bt_config.end_date)?;
    info!(series = prices, observations = observations.len(), "prices loaded");

    strategies
        .iter()
        .map(|strategy| {
            info!(strategy = %strategy.name, "running backtest");
            backtest_engine::run_strategy(&observations, strategy, bt_config)
        })
        .collect()
}

fn prepare(config_path: &PathBuf) -> Result<(FileConfigAdapter, BacktestConfig, String), ExitCode> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter).map_err(|e| fail(&e))?;
    validate_backtest_config(&adapter).map_err(|e| fail(&e))?;
    let bt_config = build_backtest_config(&adapter).map_err(|e| fail(&e))?;
    let prices = prices_series(&adapter).map_err(|e| fail(&e))?;
    Ok((adapter, bt_config, prices))
}

fn run_backtest(
    config_path: &PathBuf,
    strategy_path: Option<&PathBuf>,
    preset: Option<Preset>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let (adapter, bt_config, prices) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let strategy = match resolve_strategy(&adapter, strategy_path, preset) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let data_port = build_data_adapter(&adapter);
    let results = match run_backtest_pipeline(&data_port, &prices, &[strategy], &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    for result in &results {
        print_summary(result);
    }

    if let Some(output) = output_path {
        for result in &results {
            if let Err(e) = CsvReportAdapter::new().write(result, output) {
                return fail(&e);
            }
        }
        eprintln!("\nReport written to: {}", output.display());
    }
    ExitCode::SUCCESS
}

fn run_compare(config_path: &PathBuf, output_path: Option<&PathBuf>) -> ExitCode {
    let (adapter, bt_config, prices) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let strategies: Vec<Strategy> = Preset::ALL.iter().map(|&p| Strategy::preset(p)).collect();
    let data_port = build_data_adapter(&adapter);
    let results = match run_backtest_pipeline(&data_port, &prices, &strategies, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    for result in &results {
        print_summary(result);
    }
    print_comparison(&results);

    if let Some(output) = output_path {
        if let Err(e) = CsvReportAdapter::new().write_all(&results, output) {
            return fail(&e);
        }
        eprintln!("\nReports written next to: {}", output.display());
    }
    ExitCode::SUCCESS
}

pub fn run_dry_run(
    config_path: &PathBuf,
    strategy_path: Option<&PathBuf>,
    preset: Option<Preset>,
) -> ExitCode {
    let (adapter, bt_config, prices) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let strategy = match resolve_strategy(&adapter, strategy_path, preset) {
        Ok(s) => s,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    eprintln!("\nData:");
    eprintln!("  prices:      {}", prices);
    eprintln!(
        "  date_format: {}",
        adapter
            .get_string("data", "date_format")
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string())
    );
    eprintln!(
        "  range:       {} to {}",
        bt_config
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "first observation".into()),
        bt_config
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "last observation".into()),
    );
    if let Some(years) = bt_config.span_years {
        eprintln!("  span_years:  {}", years);
    }

    print_strategy(&strategy);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(strategy_path: &PathBuf) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = match load_config(strategy_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }
    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    print_strategy(&strategy);
    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}

fn run_seasonality(config_path: &PathBuf) -> ExitCode {
    let (adapter, bt_config, prices) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if let Err(e) = validate_seasonality_config(&adapter) {
        return fail(&e);
    }
    let window = match build_seasonality_window(&adapter) {
        Ok(w) => w,
        Err(e) => return fail(&e),
    };

    let data_port = build_data_adapter(&adapter);
    let observations =
        match data_port.fetch_observations(&prices, bt_config.start_date, bt_config.end_date) {
            Ok(o) => o,
            Err(e) => return fail(&e),
        };
    if let Err(e) = observation::validate_observations(&observations) {
        return fail(&e);
    }

    let arrivals = match adapter
        .get_string("data", "arrivals")
        .filter(|s| !s.trim().is_empty())
    {
        Some(series) => match data_port.fetch_arrivals(series.trim()) {
            Ok(a) => Some(a),
            Err(e) => return fail(&e),
        },
        None => None,
    };

    match seasonality::analyze(&observations, arrivals.as_deref(), window) {
        Ok(report) => {
            print_seasonality(&report, &observations);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_strategy(strategy: &Strategy) {
    eprintln!("\nStrategy:");
    eprintln!("  name:      {}", strategy.name);
    eprintln!("  months:    {}", strategy.signal);
    match &strategy.stop_loss {
        Some(overlay) => eprintln!(
            "  stop loss: {} over {} observations",
            overlay.threshold(),
            overlay.lag()
        ),
        None => eprintln!("  stop loss: none"),
    }
}

fn format_metric(value: &MetricResult, scale: f64, suffix: &str, precision: usize) -> String {
    match value {
        Ok(v) => format!("{:.*}{}", precision, v * scale, suffix),
        Err(e) => format!("undefined ({})", e.reason),
    }
}

pub fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} ===", result.strategy_name);
    eprintln!("Observations:     {}", result.dates.len());
    eprintln!("Final Wealth:     {:.4}", result.series.final_wealth());
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("CAGR:             {}", format_metric(&m.cagr, 100.0, "%", 2));
    eprintln!(
        "Volatility:       {}",
        format_metric(&m.volatility, 100.0, "%", 2)
    );
    eprintln!(
        "Naive Sharpe:     {}",
        format_metric(&m.naive_sharpe, 1.0, "", 2)
    );
    eprintln!(
        "Win Rate:         {}",
        format_metric(&m.win_rate, 100.0, "%", 1)
    );
    eprintln!(
        "Max Drawdown:     {}",
        format_metric(&m.max_drawdown, 100.0, "%", 1)
    );
    eprintln!("DD Duration:      {} observations", m.max_drawdown_duration);
    eprintln!("Active Days:      {} ({} winning)", m.active_days, m.winning_days);
    if result.suppressed_days > 0 {
        eprintln!("Stop-loss flat:   {} days", result.suppressed_days);
    }

    for failure in m.failures() {
        warn!(strategy = %result.strategy_name, "{failure}");
    }
}

fn print_comparison(results: &[BacktestResult]) {
    eprintln!("\n=== Comparison ===");
    eprintln!(
        "{:<40} {:>10} {:>10} {:>10} {:>10}",
        "Strategy", "Wealth", "CAGR", "Sharpe", "MaxDD"
    );
    let cell = |v: &MetricResult, scale: f64| match v {
        Ok(x) => format!("{:.2}", x * scale),
        Err(_) => "n/a".to_string(),
    };
    for result in results {
        let m = &result.metrics;
        eprintln!(
            "{:<40} {:>10.4} {:>10} {:>10} {:>10}",
            result.strategy_name,
            result.series.final_wealth(),
            cell(&m.cagr, 100.0),
            cell(&m.naive_sharpe, 1.0),
            cell(&m.max_drawdown, 100.0),
        );
    }
}

fn print_ranked(title: &str, counts: &[usize; 12]) {
    println!("\n{title}");
    for (month, count) in ExtremeMonthCounts::ranked(counts) {
        println!("  {:<10} {}", MONTH_NAMES[(month - 1) as usize], count);
    }
}

fn print_seasonality(report: &SeasonalityReport, observations: &[Observation]) {
    println!(
        "{}-observation returns over {} observations: mean {:.4}%, std {:.4}%",
        report.window,
        observations.len(),
        report.stats.mean,
        report.stats.std,
    );
    println!(
        "Bands: above {:.4}% / below {:.4}% ({} returns)",
        report.stats.upper(),
        report.stats.lower(),
        report.stats.count,
    );
    print_ranked("Months with unusually high returns:", &report.counts.high);
    print_ranked("Months with unusually low returns:", &report.counts.low);

    if !report.arrival_changes.is_empty() {
        println!("\nArrivals month-over-month change:");
        for change in &report.arrival_changes {
            let pct = change
                .change
                .map(|c| format!("{:+.0}", c))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {}-{:02} {:>14.0} {:>10}",
                change.year, change.month, change.arrivals, pct
            );
        }
    }

    match &report.correlation {
        Some(Ok(r)) => println!("\nCorrelation (monthly returns vs arrivals): {:.4}", r),
        Some(Err(e)) => println!("\nCorrelation: {}", e),
        None => {}
    }
}
