//! CSV report adapter implementing ReportPort.
//!
//! Writes the per-observation series to `output_path` and the metrics record
//! to a sibling `<stem>_metrics.csv`. Undefined values are left empty; a
//! failed metric carries its reason in the `error` column.

use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SeasontraderError;
use crate::domain::metrics::{MetricResult, Metrics};
use crate::ports::report_port::ReportPort;
use tracing::info;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn metrics_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        output_path.with_file_name(format!("{}_metrics.csv", stem))
    }
}

fn csv_error(path: &Path, e: csv::Error) -> SeasontraderError {
    SeasontraderError::DataSource {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn metric_rows(metrics: &Metrics) -> Vec<[String; 3]> {
    let row = |name: &str, value: &MetricResult| match value {
        Ok(v) => [name.to_string(), v.to_string(), String::new()],
        Err(e) => [name.to_string(), String::new(), e.reason.clone()],
    };
    vec![
        ["years".into(), metrics.years.to_string(), String::new()],
        [
            "total_return".into(),
            metrics.total_return.to_string(),
            String::new(),
        ],
        row("cagr", &metrics.cagr),
        row("volatility", &metrics.volatility),
        row("naive_sharpe", &metrics.naive_sharpe),
        row("win_rate", &metrics.win_rate),
        row("max_drawdown", &metrics.max_drawdown),
        [
            "max_drawdown_duration".into(),
            metrics.max_drawdown_duration.to_string(),
            String::new(),
        ],
        [
            "active_days".into(),
            metrics.active_days.to_string(),
            String::new(),
        ],
        [
            "winning_days".into(),
            metrics.winning_days.to_string(),
            String::new(),
        ],
    ]
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SeasontraderError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| csv_error(output_path, e))?;
        wtr.write_record([
            "date",
            "base_signal",
            "signal",
            "daily_return",
            "strategy_return",
            "wealth",
            "drawdown",
        ])
        .map_err(|e| csv_error(output_path, e))?;

        for i in 0..result.dates.len() {
            wtr.write_record([
                result.dates[i].format("%Y-%m-%d").to_string(),
                result.base_signals[i].value().to_string(),
                result.signals[i].value().to_string(),
                optional(result.series.daily_returns[i]),
                optional(result.series.strategy_returns[i]),
                result.series.wealth[i].to_string(),
                result.drawdown[i].to_string(),
            ])
            .map_err(|e| csv_error(output_path, e))?;
        }
        wtr.flush()?;

        let metrics_path = Self::metrics_path(output_path);
        let mut wtr =
            csv::Writer::from_path(&metrics_path).map_err(|e| csv_error(&metrics_path, e))?;
        wtr.write_record(["strategy", "metric", "value", "error"])
            .map_err(|e| csv_error(&metrics_path, e))?;
        for [name, value, error] in metric_rows(&result.metrics) {
            wtr.write_record([
                result.strategy_name.as_str(),
                name.as_str(),
                value.as_str(),
                error.as_str(),
            ])
            .map_err(|e| csv_error(&metrics_path, e))?;
        }
        wtr.flush()?;

        info!(
            series = %output_path.display(),
            metrics = %metrics_path.display(),
            "report written"
        );
        Ok(())
    }
}
