//! Seasonality analysis of the exchange rate against tourist arrivals.
//!
//! Window returns are n-observation percentage changes (x100); a window of
//! 23 trading days approximates one calendar month. Days whose window
//! return sits one sample standard deviation above or below the mean are
//! tallied per calendar month to show which months look seasonally strong.

use crate::domain::error::{MetricError, MetricKind, SeasontraderError};
use crate::domain::observation::{Observation, TourismArrival};
use chrono::Datelike;
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW: usize = 23;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn window_returns(
    observations: &[Observation],
    window: usize,
) -> Result<Vec<Option<f64>>, SeasontraderError> {
    if window == 0 || observations.len() <= window {
        return Err(SeasontraderError::InsufficientData {
            operation: "window returns",
            have: observations.len(),
            need: window + 1,
        });
    }

    Ok((0..observations.len())
        .map(|i| {
            (i >= window)
                .then(|| (observations[i].close / observations[i - window].close - 1.0) * 100.0)
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStats {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

impl ReturnStats {
    pub fn from_returns(returns: &[Option<f64>]) -> Result<Self, SeasontraderError> {
        let values: Vec<f64> = returns.iter().flatten().copied().collect();
        if values.len() < 2 {
            return Err(SeasontraderError::InsufficientData {
                operation: "return statistics",
                have: values.len(),
                need: 2,
            });
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Ok(Self {
            mean,
            std: variance.sqrt(),
            count: values.len(),
        })
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.std
    }

    pub fn lower(&self) -> f64 {
        self.mean - self.std
    }
}

/// Per calendar month (index 0 = January), how many days had an extreme
/// window return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtremeMonthCounts {
    pub high: [usize; 12],
    pub low: [usize; 12],
}

impl ExtremeMonthCounts {
    /// Months ordered by descending count, ties broken by calendar order.
    /// Months with no extreme days are omitted.
    pub fn ranked(counts: &[usize; 12]) -> Vec<(u32, usize)> {
        let mut ranked: Vec<(u32, usize)> = counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(i, c)| ((i + 1) as u32, *c))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

pub fn extreme_month_counts(
    observations: &[Observation],
    window_returns: &[Option<f64>],
    stats: &ReturnStats,
) -> ExtremeMonthCounts {
    let mut counts = ExtremeMonthCounts::default();
    for (obs, r) in observations.iter().zip(window_returns) {
        let Some(r) = r else { continue };
        let idx = (obs.date.month() - 1) as usize;
        if *r >= stats.upper() {
            counts.high[idx] += 1;
        }
        if *r <= stats.lower() {
            counts.low[idx] += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalChange {
    pub year: i32,
    pub month: u32,
    pub arrivals: f64,
    /// Change from the previous calendar month, when that month is present.
    pub change: Option<f64>,
}

pub fn arrival_changes(arrivals: &[TourismArrival]) -> Vec<ArrivalChange> {
    let mut sorted = arrivals.to_vec();
    sorted.sort_by_key(|a| (a.year, a.month));

    let mut out: Vec<ArrivalChange> = Vec::with_capacity(sorted.len());
    for (i, a) in sorted.iter().enumerate() {
        let change = if i > 0 {
            let prev = &sorted[i - 1];
            let (py, pm) = previous_month(a.year, a.month);
            (prev.year == py && prev.month == pm).then(|| a.arrivals - prev.arrivals)
        } else {
            None
        };
        out.push(ArrivalChange {
            year: a.year,
            month: a.month,
            arrivals: a.arrivals,
            change,
        });
    }
    out
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// Compounded close-to-close return for each (year, month) present.
pub fn calendar_month_returns(observations: &[Observation]) -> BTreeMap<(i32, u32), f64> {
    let mut grouped: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for pair in observations.windows(2) {
        let r = pair[1].close / pair[0].close - 1.0;
        let key = (pair[1].date.year(), pair[1].date.month());
        let growth = grouped.entry(key).or_insert(1.0);
        *growth *= 1.0 + r;
    }
    grouped.into_iter().map(|(k, g)| (k, g - 1.0)).collect()
}

/// Pearson correlation between calendar-month currency returns and that
/// month's arrivals, over the months present in both series.
pub fn monthly_correlation(
    observations: &[Observation],
    arrivals: &[TourismArrival],
) -> Result<f64, MetricError> {
    let returns = calendar_month_returns(observations);
    let pairs: Vec<(f64, f64)> = arrivals
        .iter()
        .filter_map(|a| returns.get(&(a.year, a.month)).map(|r| (*r, a.arrivals)))
        .collect();
    pearson(&pairs)
}

pub fn pearson(pairs: &[(f64, f64)]) -> Result<f64, MetricError> {
    if pairs.len() < 2 {
        return Err(MetricError::new(
            MetricKind::Correlation,
            format!("need at least 2 aligned months, have {}", pairs.len()),
        ));
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Err(MetricError::new(
            MetricKind::Correlation,
            "one of the series has zero variance",
        ));
    }
    Ok(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalityReport {
    pub window: usize,
    pub stats: ReturnStats,
    pub counts: ExtremeMonthCounts,
    pub arrival_changes: Vec<ArrivalChange>,
    pub correlation: Option<Result<f64, MetricError>>,
}

/// Runs the full analysis. Arrivals are optional; without them the report
/// only carries the currency side.
pub fn analyze(
    observations: &[Observation],
    arrivals: Option<&[TourismArrival]>,
    window: usize,
) -> Result<SeasonalityReport, SeasontraderError> {
    let returns = window_returns(observations, window)?;
    let stats = ReturnStats::from_returns(&returns)?;
    let counts = extreme_month_counts(observations, &returns, &stats);

    let (arrival_changes, correlation) = match arrivals {
        Some(a) => (
            arrival_changes(a),
            Some(monthly_correlation(observations, a)),
        ),
        None => (Vec::new(), None),
    };

    Ok(SeasonalityReport {
        window,
        stats,
        counts,
        arrival_changes,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn obs_on(y: i32, m: u32, d: u32, close: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), close)
    }

    fn arrival(year: i32, month: u32, arrivals: f64) -> TourismArrival {
        TourismArrival {
            year,
            month,
            arrivals,
        }
    }

    #[test]
    fn window_returns_percent() {
        let obs = vec![
            obs_on(2024, 1, 1, 100.0),
            obs_on(2024, 1, 2, 105.0),
            obs_on(2024, 1, 3, 110.0),
        ];
        let r = window_returns(&obs, 2).unwrap();
        assert_eq!(r[0], None);
        assert_eq!(r[1], None);
        assert_abs_diff_eq!(r[2].unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn window_returns_needs_more_than_window() {
        let obs = vec![obs_on(2024, 1, 1, 100.0), obs_on(2024, 1, 2, 105.0)];
        assert!(window_returns(&obs, 2).is_err());
        assert!(window_returns(&obs, 0).is_err());
    }

    #[test]
    fn stats_use_sample_stddev() {
        let stats = ReturnStats::from_returns(&[None, Some(1.0), Some(3.0)]).unwrap();
        assert_abs_diff_eq!(stats.mean, 2.0);
        assert_abs_diff_eq!(stats.std, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(stats.count, 2);
        assert_abs_diff_eq!(stats.upper(), 2.0 + 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn extreme_counts_bucket_by_month() {
        let obs = vec![
            obs_on(2024, 3, 1, 1.0),
            obs_on(2024, 9, 1, 1.0),
            obs_on(2024, 9, 2, 1.0),
            obs_on(2024, 11, 1, 1.0),
        ];
        let returns = vec![Some(-5.0), Some(5.0), Some(4.0), Some(0.0)];
        let stats = ReturnStats {
            mean: 0.0,
            std: 2.0,
            count: 4,
        };
        let counts = extreme_month_counts(&obs, &returns, &stats);
        assert_eq!(counts.high[8], 2);
        assert_eq!(counts.low[2], 1);
        assert_eq!(counts.high.iter().sum::<usize>(), 2);
        assert_eq!(counts.low.iter().sum::<usize>(), 1);
        assert_eq!(ExtremeMonthCounts::ranked(&counts.high), vec![(9, 2)]);
    }

    #[test]
    fn ranked_breaks_ties_by_month() {
        let mut counts = [0usize; 12];
        counts[10] = 3;
        counts[3] = 3;
        counts[4] = 5;
        assert_eq!(
            ExtremeMonthCounts::ranked(&counts),
            vec![(5, 5), (4, 3), (11, 3)]
        );
    }

    #[test]
    fn arrival_changes_only_for_consecutive_months() {
        let arrivals = vec![
            arrival(2023, 1, 150.0),
            arrival(2022, 12, 100.0),
            arrival(2023, 3, 90.0),
        ];
        let changes = arrival_changes(&arrivals);
        assert_eq!(changes[0].change, None);
        assert_eq!((changes[1].year, changes[1].month), (2023, 1));
        assert_eq!(changes[1].change, Some(50.0));
        assert_eq!(changes[2].change, None);
    }

    #[test]
    fn calendar_month_returns_compound_daily_moves() {
        let obs = vec![
            obs_on(2024, 1, 30, 100.0),
            obs_on(2024, 1, 31, 110.0),
            obs_on(2024, 2, 1, 99.0),
            obs_on(2024, 2, 2, 108.9),
        ];
        let r = calendar_month_returns(&obs);
        assert_abs_diff_eq!(r[&(2024, 1)], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(r[&(2024, 2)], 108.9 / 110.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pearson_perfect_correlation() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert_abs_diff_eq!(pearson(&pairs).unwrap(), 1.0, epsilon = 1e-12);
        let inverse = [(1.0, 6.0), (2.0, 4.0), (3.0, 2.0)];
        assert_abs_diff_eq!(pearson(&inverse).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert!(pearson(&[(1.0, 1.0)]).is_err());
        let err = pearson(&[(1.0, 1.0), (1.0, 2.0)]).unwrap_err();
        assert_eq!(err.metric, MetricKind::Correlation);
    }

    #[test]
    fn analyze_without_arrivals() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let obs: Vec<Observation> = (0..40)
            .map(|i| {
                Observation::new(
                    start + chrono::Duration::days(i),
                    100.0 + (i % 5) as f64,
                )
            })
            .collect();
        let report = analyze(&obs, None, 3).unwrap();
        assert_eq!(report.window, 3);
        assert_eq!(report.stats.count, 37);
        assert!(report.correlation.is_none());
        assert!(report.arrival_changes.is_empty());
    }
}
