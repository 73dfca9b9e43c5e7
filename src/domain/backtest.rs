//! Backtest pipeline: signal, compounding, optional stop-loss overlay and
//! performance evaluation, composed as pure steps over immutable series.

use crate::domain::error::SeasontraderError;
use crate::domain::metrics::{self, Metrics, YearSpan};
use crate::domain::observation::{self, Observation};
use crate::domain::returns::{self, CompoundedSeries};
use crate::domain::signal::{self, Position, SignalFunction};
use crate::domain::stop_loss::StopLossOverlay;
use crate::domain::strategy::Strategy;
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Forces the CAGR exponent instead of deriving it from the dates.
    pub span_years: Option<f64>,
}

impl BacktestConfig {
    pub fn span_for(&self, first: NaiveDate, last: NaiveDate) -> YearSpan {
        match self.span_years {
            Some(years) => YearSpan::fixed(years),
            None => YearSpan::from_dates(first, last),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub dates: Vec<NaiveDate>,
    pub base_signals: Vec<Position>,
    /// Equal to `base_signals` unless a stop-loss overlay ran.
    pub signals: Vec<Position>,
    pub series: CompoundedSeries,
    pub drawdown: Vec<f64>,
    pub metrics: Metrics,
    pub suppressed_days: usize,
}

impl BacktestResult {
    pub fn wealth(&self) -> &[f64] {
        &self.series.wealth
    }
}

pub fn run_backtest(
    name: &str,
    observations: &[Observation],
    signal: &dyn SignalFunction,
    stop_loss: Option<&StopLossOverlay>,
    config: &BacktestConfig,
) -> Result<BacktestResult, SeasontraderError> {
    let observations = observation::filter_range(observations, config.start_date, config.end_date);
    observation::validate_observations(&observations)?;
    if observations.len() < returns::MIN_OBSERVATIONS {
        return Err(SeasontraderError::InsufficientData {
            operation: "backtest",
            have: observations.len(),
            need: returns::MIN_OBSERVATIONS,
        });
    }

    let base_signals = signal::signal_series(&observations, signal)?;

    let (signals, series, suppressed_days) = match stop_loss {
        Some(overlay) => {
            let outcome = overlay.apply(&observations, &base_signals)?;
            let suppressed = outcome.suppressed_days();
            (outcome.effective_signals, outcome.overlaid, suppressed)
        }
        None => {
            let series = returns::compound(&observations, &base_signals)?;
            (base_signals.clone(), series, 0)
        }
    };

    let drawdown = metrics::drawdown_series(&series.wealth)?;

    let first = observations[0].date;
    let last = observations[observations.len() - 1].date;
    let span = config.span_for(first, last);
    let metrics = Metrics::evaluate(&series.wealth, &series.strategy_returns, span)?;

    debug!(
        strategy = name,
        observations = observations.len(),
        final_wealth = series.final_wealth(),
        suppressed_days,
        "backtest complete"
    );

    Ok(BacktestResult {
        strategy_name: name.to_string(),
        dates: observations.iter().map(|o| o.date).collect(),
        base_signals,
        signals,
        series,
        drawdown,
        metrics,
        suppressed_days,
    })
}

pub fn run_strategy(
    observations: &[Observation],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, SeasontraderError> {
    run_backtest(
        &strategy.name,
        observations,
        &strategy.signal,
        strategy.stop_loss.as_ref(),
        config,
    )
}
