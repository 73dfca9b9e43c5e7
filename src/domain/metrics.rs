//! Performance metrics over a cumulative wealth curve.
//!
//! Every metric is a standalone function of the wealth and/or strategy
//! return series. [`Metrics::evaluate`] collects them into one record and
//! keeps a failed metric as an `Err` next to the ones that succeeded.

use crate::domain::error::{MetricError, MetricKind, SeasontraderError};
use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.25;

pub type MetricResult = Result<f64, MetricError>;

/// Time span a wealth curve covers, used as the CAGR exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearSpan(f64);

impl YearSpan {
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Self {
        Self((last - first).num_days() as f64 / CALENDAR_DAYS_PER_YEAR)
    }

    pub fn fixed(years: f64) -> Self {
        Self(years)
    }

    pub fn years(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub years: f64,
    pub total_return: f64,
    pub cagr: MetricResult,
    pub volatility: MetricResult,
    pub naive_sharpe: MetricResult,
    pub win_rate: MetricResult,
    pub max_drawdown: MetricResult,
    pub max_drawdown_duration: usize,
    pub active_days: usize,
    pub winning_days: usize,
}

impl Metrics {
    pub fn evaluate(
        wealth: &[f64],
        strategy_returns: &[Option<f64>],
        span: YearSpan,
    ) -> Result<Self, SeasontraderError> {
        if wealth.len() < 2 {
            return Err(SeasontraderError::InsufficientData {
                operation: "performance metrics",
                have: wealth.len(),
                need: 2,
            });
        }
        if strategy_returns.len() != wealth.len() {
            return Err(SeasontraderError::MisalignedSeries {
                expected: wealth.len(),
                actual: strategy_returns.len(),
            });
        }

        let first = wealth[0];
        let last = wealth[wealth.len() - 1];
        let total_return = last / first - 1.0;

        let cagr = cagr(wealth, span.years());
        let volatility = annualized_volatility(strategy_returns);
        let naive_sharpe = match (&cagr, &volatility) {
            (Ok(c), Ok(v)) => naive_sharpe(*c, *v),
            (Err(e), _) | (_, Err(e)) => Err(MetricError::new(
                MetricKind::NaiveSharpe,
                format!("depends on {}", e),
            )),
        };

        let defined = || strategy_returns.iter().flatten();
        let active_days = defined().filter(|&&r| r != 0.0).count();
        let winning_days = defined().filter(|&&r| r > 0.0).count();

        Ok(Metrics {
            years: span.years(),
            total_return,
            cagr,
            volatility,
            naive_sharpe,
            win_rate: win_rate(strategy_returns),
            max_drawdown: max_drawdown(wealth),
            max_drawdown_duration: max_drawdown_duration(wealth),
            active_days,
            winning_days,
        })
    }

    /// Every metric that could not be computed.
    pub fn failures(&self) -> Vec<&MetricError> {
        [
            &self.cagr,
            &self.volatility,
            &self.naive_sharpe,
            &self.win_rate,
            &self.max_drawdown,
        ]
        .into_iter()
        .filter_map(|m| m.as_ref().err())
        .collect()
    }
}

/// `wealth[last]^(1/years) - 1`
pub fn cagr(wealth: &[f64], years: f64) -> MetricResult {
    let final_wealth = *wealth
        .last()
        .ok_or_else(|| MetricError::new(MetricKind::Cagr, "empty wealth series"))?;
    if !years.is_finite() || years <= 0.0 {
        return Err(MetricError::new(
            MetricKind::Cagr,
            format!("span of {} years is not positive", years),
        ));
    }
    if final_wealth.is_nan() || final_wealth <= 0.0 {
        return Err(MetricError::new(
            MetricKind::Cagr,
            format!("final wealth {} has no real root", final_wealth),
        ));
    }
    Ok(final_wealth.powf(1.0 / years) - 1.0)
}

/// Sample standard deviation (n - 1) of the defined strategy returns,
/// scaled by sqrt(252).
pub fn annualized_volatility(strategy_returns: &[Option<f64>]) -> MetricResult {
    let returns: Vec<f64> = strategy_returns.iter().flatten().copied().collect();
    if returns.len() < 2 {
        return Err(MetricError::new(
            MetricKind::Volatility,
            format!("need at least 2 returns, have {}", returns.len()),
        ));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// CAGR divided by volatility, with no risk-free rate subtracted.
pub fn naive_sharpe(cagr: f64, volatility: f64) -> MetricResult {
    if volatility == 0.0 {
        return Err(MetricError::new(
            MetricKind::NaiveSharpe,
            "volatility is zero",
        ));
    }
    Ok(cagr / volatility)
}

/// Positive days over nonzero days.
pub fn win_rate(strategy_returns: &[Option<f64>]) -> MetricResult {
    let (wins, trades) = strategy_returns
        .iter()
        .flatten()
        .filter(|&&r| r != 0.0)
        .fold((0usize, 0usize), |(w, t), &r| {
            (if r > 0.0 { w + 1 } else { w }, t + 1)
        });

    if trades == 0 {
        return Err(MetricError::new(
            MetricKind::WinRate,
            "no nonzero strategy returns",
        ));
    }
    Ok(wins as f64 / trades as f64)
}

/// `(wealth[i] - peak[i]) / peak[i]` where `peak` is the running maximum.
/// The curve must start from a positive, finite value.
pub fn drawdown_series(wealth: &[f64]) -> Result<Vec<f64>, MetricError> {
    match wealth.first() {
        Some(&w) if w > 0.0 && w.is_finite() => {}
        Some(&w) => {
            return Err(MetricError::new(
                MetricKind::MaxDrawdown,
                format!("initial wealth {} is not positive", w),
            ));
        }
        None => {
            return Err(MetricError::new(
                MetricKind::MaxDrawdown,
                "empty wealth series",
            ));
        }
    }

    let mut peak = f64::NEG_INFINITY;
    Ok(wealth
        .iter()
        .map(|&w| {
            peak = peak.max(w);
            (w - peak) / peak
        })
        .collect())
}

pub fn max_drawdown(wealth: &[f64]) -> MetricResult {
    let series = drawdown_series(wealth)?;
    Ok(series.into_iter().fold(0.0_f64, f64::min))
}

/// Longest run of consecutive observations spent below a prior peak.
pub fn max_drawdown_duration(wealth: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0usize;
    let mut longest = 0usize;

    for &w in wealth {
        if w >= peak {
            peak = w;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }

    longest
}
