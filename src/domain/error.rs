//! Domain error types.

use chrono::NaiveDate;
use std::fmt;

/// Performance metric identity, used to flag which metric failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cagr,
    Volatility,
    NaiveSharpe,
    WinRate,
    MaxDrawdown,
    Correlation,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Cagr => "CAGR",
            MetricKind::Volatility => "volatility",
            MetricKind::NaiveSharpe => "naive Sharpe",
            MetricKind::WinRate => "win rate",
            MetricKind::MaxDrawdown => "max drawdown",
            MetricKind::Correlation => "correlation",
        };
        f.write_str(name)
    }
}

/// A ratio or root metric that has no real value for its inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("undefined {metric}: {reason}")]
pub struct MetricError {
    pub metric: MetricKind,
    pub reason: String,
}

impl MetricError {
    pub fn new(metric: MetricKind, reason: impl Into<String>) -> Self {
        Self {
            metric,
            reason: reason.into(),
        }
    }
}

/// Top-level error type for seasontrader.
#[derive(Debug, thiserror::Error)]
pub enum SeasontraderError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data for {operation}: have {have} observations, need {need}")]
    InsufficientData {
        operation: &'static str,
        have: usize,
        need: usize,
    },

    #[error(transparent)]
    UndefinedMetric(#[from] MetricError),

    #[error("invalid signal {value} on {date}: expected -1, 0 or 1")]
    InvalidSignal { date: NaiveDate, value: i8 },

    #[error("misaligned series: expected {expected} values, got {actual}")]
    MisalignedSeries { expected: usize, actual: usize },

    #[error("invalid stop-loss threshold {value}: must be finite and <= 0")]
    InvalidThreshold { value: f64 },

    #[error("observations out of order: {date} does not follow {previous}")]
    UnorderedObservations { previous: NaiveDate, date: NaiveDate },

    #[error("invalid observation on {date}: close {close} must be positive and finite")]
    InvalidObservation { date: NaiveDate, close: f64 },

    #[error("invalid month map: {reason}")]
    InvalidMonthMap { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SeasontraderError> for std::process::ExitCode {
    fn from(err: &SeasontraderError) -> Self {
        let code: u8 = match err {
            SeasontraderError::Io(_) => 1,
            SeasontraderError::ConfigParse { .. }
            | SeasontraderError::ConfigMissing { .. }
            | SeasontraderError::ConfigInvalid { .. } => 2,
            SeasontraderError::DataSource { .. }
            | SeasontraderError::UnorderedObservations { .. }
            | SeasontraderError::InvalidObservation { .. } => 3,
            SeasontraderError::InvalidSignal { .. }
            | SeasontraderError::InvalidMonthMap { .. }
            | SeasontraderError::InvalidThreshold { .. }
            | SeasontraderError::MisalignedSeries { .. } => 4,
            SeasontraderError::InsufficientData { .. } => 5,
            SeasontraderError::UndefinedMetric(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
