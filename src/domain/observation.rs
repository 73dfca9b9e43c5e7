//! Price observations and tourism arrival records.

use crate::domain::error::SeasontraderError;
use chrono::NaiveDate;

/// A single daily closing price of the exchange rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Monthly tourist arrivals for one (year, month).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TourismArrival {
    pub year: i32,
    pub month: u32,
    pub arrivals: f64,
}

/// Checks the ingestion contract: closes positive and finite, dates strictly
/// increasing (which also rules out duplicates).
pub fn validate_observations(observations: &[Observation]) -> Result<(), SeasontraderError> {
    for obs in observations {
        if !obs.close.is_finite() || obs.close <= 0.0 {
            return Err(SeasontraderError::InvalidObservation {
                date: obs.date,
                close: obs.close,
            });
        }
    }

    for pair in observations.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(SeasontraderError::UnorderedObservations {
                previous: pair[0].date,
                date: pair[1].date,
            });
        }
    }

    Ok(())
}

/// Keeps observations whose date falls inside the inclusive range.
pub fn filter_range(
    observations: &[Observation],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| start.is_none_or(|s| o.date >= s))
        .filter(|o| end.is_none_or(|e| o.date <= e))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, close: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), close)
    }

    #[test]
    fn ascending_positive_series_is_valid() {
        let series = vec![obs(1, 100.0), obs(2, 101.0), obs(5, 99.5)];
        assert!(validate_observations(&series).is_ok());
    }

    #[test]
    fn empty_series_is_valid() {
        assert!(validate_observations(&[]).is_ok());
    }

    #[test]
    fn duplicate_date_rejected() {
        let series = vec![obs(1, 100.0), obs(1, 101.0)];
        assert!(matches!(
            validate_observations(&series),
            Err(SeasontraderError::UnorderedObservations { .. })
        ));
    }

    #[test]
    fn descending_dates_rejected() {
        let series = vec![obs(3, 100.0), obs(2, 101.0)];
        assert!(matches!(
            validate_observations(&series),
            Err(SeasontraderError::UnorderedObservations { .. })
        ));
    }

    #[test]
    fn non_positive_close_rejected() {
        let series = vec![obs(1, 100.0), obs(2, 0.0)];
        assert!(matches!(
            validate_observations(&series),
            Err(SeasontraderError::InvalidObservation { .. })
        ));
    }

    #[test]
    fn nan_close_rejected() {
        let series = vec![obs(1, f64::NAN)];
        assert!(validate_observations(&series).is_err());
    }

    #[test]
    fn filter_range_is_inclusive() {
        let series = vec![obs(1, 1.0), obs(2, 2.0), obs(3, 3.0), obs(4, 4.0)];
        let start = NaiveDate::from_ymd_opt(2024, 1, 2);
        let end = NaiveDate::from_ymd_opt(2024, 1, 3);
        let filtered = filter_range(&series, start, end);
        assert_eq!(filtered, vec![obs(2, 2.0), obs(3, 3.0)]);
    }

    #[test]
    fn filter_range_open_ended() {
        let series = vec![obs(1, 1.0), obs(2, 2.0)];
        assert_eq!(filter_range(&series, None, None).len(), 2);
    }
}
