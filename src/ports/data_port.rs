//! Data access port trait.

use crate::domain::error::SeasontraderError;
use crate::domain::observation::{Observation, TourismArrival};
use chrono::NaiveDate;

pub trait DataPort {
    /// Closing prices for `series`, ascending by date, restricted to the
    /// inclusive range when bounds are given.
    fn fetch_observations(
        &self,
        series: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Observation>, SeasontraderError>;

    /// Monthly tourist arrivals for `series`, ordered by (year, month).
    fn fetch_arrivals(&self, series: &str) -> Result<Vec<TourismArrival>, SeasontraderError>;
}
