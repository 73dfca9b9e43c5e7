//! CSV file data adapter.
//!
//! Price files need `Date` and `Close` columns (any case, any position).
//! Arrival files need `Year` and `Month number` (or `Month`) columns plus an
//! arrivals column, found by a header containing "arrivals" or else the
//! first remaining column. Files that are not valid UTF-8 are decoded as
//! ISO-8859-1.

use crate::domain::error::SeasontraderError;
use crate::domain::observation::{Observation, TourismArrival};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
    date_format: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    fn csv_path(&self, series: &str) -> PathBuf {
        let path = self.base_path.join(series);
        if path.extension().is_some() {
            path
        } else {
            self.base_path.join(format!("{}.csv", series))
        }
    }

    fn read_reader(
        &self,
        series: &str,
    ) -> Result<csv::Reader<std::io::Cursor<Vec<u8>>>, SeasontraderError> {
        let path = self.csv_path(series);
        let bytes = fs::read(&path).map_err(|e| SeasontraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let content = decode(bytes);
        Ok(csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(std::io::Cursor::new(content.into_bytes())))
    }
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

fn normalize_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h.as_str()))
}

fn parse_number(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    raw.replace([',', '"'], "").trim().parse()
}

impl DataPort for CsvAdapter {
    fn fetch_observations(
        &self,
        series: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Observation>, SeasontraderError> {
        let mut rdr = self.read_reader(series)?;
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| SeasontraderError::DataSource {
                reason: format!("CSV header error: {}", e),
            })?
            .iter()
            .map(normalize_header)
            .collect();

        let date_col = find_column(&headers, &["date"]).ok_or_else(|| {
            SeasontraderError::DataSource {
                reason: "missing date column".into(),
            }
        })?;
        let close_col = find_column(&headers, &["close", "price"]).ok_or_else(|| {
            SeasontraderError::DataSource {
                reason: "missing close column".into(),
            }
        })?;

        let mut observations = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SeasontraderError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default();
            if date_str.is_empty() {
                warn!(series, row = line + 1, "skipping row without a date");
                continue;
            }
            let date = NaiveDate::parse_from_str(date_str, &self.date_format).map_err(|e| {
                SeasontraderError::DataSource {
                    reason: format!(
                        "invalid date '{}' (expected {}): {}",
                        date_str, self.date_format, e
                    ),
                }
            })?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default();
            if close_str.is_empty() {
                warn!(series, %date, "skipping row without a close");
                continue;
            }
            let close = parse_number(close_str).map_err(|e| SeasontraderError::DataSource {
                reason: format!("invalid close value '{}' on {}: {}", close_str, date, e),
            })?;

            observations.push(Observation { date, close });
        }

        observations.sort_by_key(|o| o.date);
        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SeasontraderError::DataSource {
                reason: format!("duplicate date {} in {}", pair[0].date, series),
            });
        }

        debug!(series, count = observations.len(), "loaded observations");
        Ok(observations)
    }

    fn fetch_arrivals(&self, series: &str) -> Result<Vec<TourismArrival>, SeasontraderError> {
        let mut rdr = self.read_reader(series)?;
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| SeasontraderError::DataSource {
                reason: format!("CSV header error: {}", e),
            })?
            .iter()
            .map(normalize_header)
            .collect();

        let year_col = find_column(&headers, &["year"]).ok_or_else(|| {
            SeasontraderError::DataSource {
                reason: "missing year column".into(),
            }
        })?;
        let month_col = find_column(&headers, &["month number", "month"]).ok_or_else(|| {
            SeasontraderError::DataSource {
                reason: "missing month column".into(),
            }
        })?;
        let arrivals_col = headers
            .iter()
            .position(|h| h.contains("arrivals"))
            .or_else(|| (0..headers.len()).find(|&i| i != year_col && i != month_col))
            .ok_or_else(|| SeasontraderError::DataSource {
                reason: "missing arrivals column".into(),
            })?;

        let mut arrivals = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SeasontraderError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let field = |col: usize, name: &str| {
                record
                    .get(col)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| SeasontraderError::DataSource {
                        reason: format!("missing {} value", name),
                    })
            };

            let year_str = field(year_col, "year")?;
            let year: i32 = year_str.parse().map_err(|e| SeasontraderError::DataSource {
                reason: format!("invalid year '{}': {}", year_str, e),
            })?;

            let month_str = field(month_col, "month")?;
            let month: u32 = month_str.parse().map_err(|e| SeasontraderError::DataSource {
                reason: format!("invalid month '{}': {}", month_str, e),
            })?;
            if !(1..=12).contains(&month) {
                return Err(SeasontraderError::DataSource {
                    reason: format!("month {} out of range 1-12", month),
                });
            }

            let arrivals_str = field(arrivals_col, "arrivals")?;
            let value = parse_number(arrivals_str).map_err(|e| SeasontraderError::DataSource {
                reason: format!("invalid arrivals value '{}': {}", arrivals_str, e),
            })?;

            arrivals.push(TourismArrival {
                year,
                month,
                arrivals: value,
            });
        }

        arrivals.sort_by_key(|a| (a.year, a.month));
        debug!(series, count = arrivals.len(), "loaded arrivals");
        Ok(arrivals)
    }
}
