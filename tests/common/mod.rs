#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use seasontrader::domain::error::SeasontraderError;
use seasontrader::domain::observation::{Observation, TourismArrival};
use seasontrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub prices: HashMap<String, Vec<Observation>>,
    pub arrivals: HashMap<String, Vec<TourismArrival>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            arrivals: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, series: &str, observations: Vec<Observation>) -> Self {
        self.prices.insert(series.to_string(), observations);
        self
    }

    pub fn with_arrivals(mut self, series: &str, arrivals: Vec<TourismArrival>) -> Self {
        self.arrivals.insert(series.to_string(), arrivals);
        self
    }

    pub fn with_error(mut self, series: &str, reason: &str) -> Self {
        self.errors.insert(series.to_string(), reason.to_string());
        self
    }

    fn check(&self, series: &str) -> Result<(), SeasontraderError> {
        match self.errors.get(series) {
            Some(reason) => Err(SeasontraderError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_observations(
        &self,
        series: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Observation>, SeasontraderError> {
        self.check(series)?;
        Ok(self
            .prices
            .get(series)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|o| start_date.is_none_or(|s| o.date >= s))
            .filter(|o| end_date.is_none_or(|e| o.date <= e))
            .collect())
    }

    fn fetch_arrivals(&self, series: &str) -> Result<Vec<TourismArrival>, SeasontraderError> {
        self.check(series)?;
        Ok(self.arrivals.get(series).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One observation per calendar day starting at `start`.
pub fn daily_series(start: NaiveDate, closes: &[f64]) -> Vec<Observation> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Observation::new(start + Duration::days(i as i64), close))
        .collect()
}

/// Weekday-only series over `[start, end]` with a deterministic wave so
/// every month carries both rising and falling days.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<Observation> {
    use chrono::Datelike;
    let mut out = Vec::new();
    let mut d = start;
    let mut close = 0.55_f64;
    let mut i = 0u32;
    while d <= end {
        if d.weekday().number_from_monday() <= 5 {
            let step = ((i % 7) as f64 - 3.0) * 0.0007 + if d.month() == 8 { 0.0004 } else { 0.0 };
            close *= 1.0 + step;
            out.push(Observation::new(d, close));
            i += 1;
        }
        d += Duration::days(1);
    }
    out
}

pub fn arrival(year: i32, month: u32, arrivals: f64) -> TourismArrival {
    TourismArrival {
        year,
        month,
        arrivals,
    }
}
