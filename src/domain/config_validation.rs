//! Configuration validation.
//!
//! Validates all config fields before a run touches any data.

use crate::domain::error::SeasontraderError;
use crate::domain::signal::MonthlySignal;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    validate_prices(config)?;
    validate_date_format(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    validate_dates(config)?;
    validate_span_years(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    validate_months(config)?;
    validate_stop_loss(config)?;
    validate_stop_loss_lag(config)?;
    Ok(())
}

pub fn validate_seasonality_config(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    match optional_int(config, "seasonality", "window")? {
        Some(window) if window < 1 => {
            Err(invalid("seasonality", "window", "window must be at least 1"))
        }
        _ => Ok(()),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SeasontraderError {
    SeasontraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Integer config value; `Ok(None)` when absent or blank, `ConfigInvalid`
/// when present but not an integer.
pub fn optional_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, SeasontraderError> {
    config
        .get_optional_int(section, key)
        .transpose()
        .map_err(|reason| invalid(section, key, reason))
}

/// Numeric config value; `Ok(None)` when absent or blank, `ConfigInvalid`
/// when present but not a number.
pub fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, SeasontraderError> {
    config
        .get_optional_double(section, key)
        .transpose()
        .map_err(|reason| invalid(section, key, reason))
}

fn validate_prices(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    match config.get_string("data", "prices") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SeasontraderError::ConfigMissing {
            section: "data".to_string(),
            key: "prices".to_string(),
        }),
    }
}

fn validate_date_format(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    let Some(format) = config.get_string("data", "date_format") else {
        return Ok(());
    };
    let broken = format.trim().is_empty()
        || StrftimeItems::new(&format).any(|item| matches!(item, Item::Error));
    if broken {
        return Err(SeasontraderError::ConfigInvalid {
            section: "data".to_string(),
            key: "date_format".to_string(),
            reason: format!("'{}' is not a valid strftime format", format),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    let start_date = parse_optional_date(config, "start_date")?;
    let end_date = parse_optional_date(config, "end_date")?;

    match (start_date, end_date) {
        (Some(start), Some(end)) if start >= end => Err(SeasontraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        }),
        _ => Ok(()),
    }
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, SeasontraderError> {
    match config
        .get_string("backtest", field)
        .filter(|s| !s.trim().is_empty())
    {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| SeasontraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}

fn validate_span_years(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    match optional_double(config, "backtest", "span_years")? {
        Some(v) if !v.is_finite() || v <= 0.0 => {
            Err(invalid("backtest", "span_years", "span_years must be positive"))
        }
        _ => Ok(()),
    }
}

fn validate_months(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    if let Some(months) = config.get_string("strategy", "months") {
        MonthlySignal::parse("validation", &months).map_err(|e| {
            SeasontraderError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "months".to_string(),
                reason: e.to_string(),
            }
        })?;
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    match optional_double(config, "strategy", "stop_loss")? {
        Some(v) if !v.is_finite() || v > 0.0 => Err(invalid(
            "strategy",
            "stop_loss",
            "stop_loss must be a finite threshold <= 0",
        )),
        _ => Ok(()),
    }
}

fn validate_stop_loss_lag(config: &dyn ConfigPort) -> Result<(), SeasontraderError> {
    match optional_int(config, "strategy", "stop_loss_lag")? {
        Some(lag) if lag < 1 => Err(invalid(
            "strategy",
            "stop_loss_lag",
            "stop_loss_lag must be at least 1",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_full_config_passes() {
        let config = make_config(
            r#"
[data]
prices = BBD_GBP.csv
date_format = %d/%m/%Y

[backtest]
start_date = 2022-01-01
end_date = 2024-12-31
span_years = 3

[strategy]
months = 3:-1, 8:1, 9:1
stop_loss = -0.00375
stop_loss_lag = 5
"#,
        );
        assert!(validate_data_config(&config).is_ok());
        assert!(validate_backtest_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
        assert!(validate_seasonality_config(&config).is_ok());
    }

    #[test]
    fn empty_sections_use_defaults() {
        let config = make_config("[backtest]\n[strategy]\n");
        assert!(validate_backtest_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn missing_prices_fails() {
        let config = make_config("[data]\ndate_format = %Y-%m-%d\n");
        assert!(matches!(
            validate_data_config(&config),
            Err(SeasontraderError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn bad_date_format_fails() {
        let config = make_config("[data]\nprices = x.csv\ndate_format = %Q\n");
        assert!(matches!(
            validate_data_config(&config),
            Err(SeasontraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[backtest]\nstart_date = 01/01/2022\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[backtest]\nstart_date = 2024-01-01\nend_date = 2023-01-01\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(SeasontraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn non_positive_span_fails() {
        let config = make_config("[backtest]\nspan_years = 0\n");
        assert!(validate_backtest_config(&config).is_err());
        let config = make_config("[backtest]\nspan_years = three\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn bad_month_map_fails() {
        let config = make_config("[strategy]\nmonths = 8:2\n");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(SeasontraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn positive_stop_loss_fails() {
        let config = make_config("[strategy]\nstop_loss = 0.01\n");
        assert!(validate_strategy_config(&config).is_err());
    }

    #[test]
    fn zero_stop_loss_passes() {
        let config = make_config("[strategy]\nstop_loss = 0\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn zero_lag_fails() {
        let config = make_config("[strategy]\nstop_loss_lag = 0\n");
        assert!(validate_strategy_config(&config).is_err());
    }

    #[test]
    fn non_numeric_lag_fails() {
        let config = make_config("[strategy]\nstop_loss = -0.01\nstop_loss_lag = 1O\n");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(SeasontraderError::ConfigInvalid { ref key, .. }) if key == "stop_loss_lag"
        ));
    }

    #[test]
    fn non_numeric_window_fails() {
        let config = make_config("[seasonality]\nwindow = abc\n");
        assert!(matches!(
            validate_seasonality_config(&config),
            Err(SeasontraderError::ConfigInvalid { ref key, .. }) if key == "window"
        ));
    }

    #[test]
    fn non_numeric_stop_loss_fails() {
        let config = make_config("[strategy]\nstop_loss = tight\n");
        assert!(validate_strategy_config(&config).is_err());
    }

    #[test]
    fn zero_window_fails() {
        let config = make_config("[seasonality]\nwindow = 0\n");
        assert!(validate_seasonality_config(&config).is_err());
    }
}
