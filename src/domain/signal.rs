//! Calendar signal functions.
//!
//! A signal function maps a calendar date to a position state. The engine
//! only ever sees the [`SignalFunction`] trait, so the month rules live in
//! the strategy rather than in the compounder.

use crate::domain::error::SeasontraderError;
use crate::domain::observation::Observation;
use chrono::{Datelike, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Short,
    Flat,
    Long,
}

impl Position {
    pub fn value(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    pub fn is_active(self) -> bool {
        self != Position::Flat
    }
}

impl TryFrom<i8> for Position {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            1 => Ok(Position::Long),
            other => Err(other),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Short => f.write_str("short"),
            Position::Flat => f.write_str("flat"),
            Position::Long => f.write_str("long"),
        }
    }
}

/// A pure, total mapping from a calendar date to a raw position value.
///
/// Implementations should return -1, 0 or 1; anything else is rejected by
/// [`signal_series`] with [`SeasontraderError::InvalidSignal`].
pub trait SignalFunction {
    fn signal(&self, date: NaiveDate) -> i8;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> SignalFunction for F
where
    F: Fn(NaiveDate) -> i8,
{
    fn signal(&self, date: NaiveDate) -> i8 {
        self(date)
    }
}

/// Signal keyed only by calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySignal {
    name: String,
    months: [Position; 12],
}

impl MonthlySignal {
    pub fn new(name: impl Into<String>, months: [Position; 12]) -> Self {
        Self {
            name: name.into(),
            months,
        }
    }

    /// Short in March, long in August and September, flat otherwise.
    pub fn short_march_long_late_summer() -> Self {
        let mut months = [Position::Flat; 12];
        months[2] = Position::Short;
        months[7] = Position::Long;
        months[8] = Position::Long;
        Self::new("Short Mar, long Aug-Sep", months)
    }

    /// Long in August and September, flat otherwise.
    pub fn long_late_summer() -> Self {
        let mut months = [Position::Flat; 12];
        months[7] = Position::Long;
        months[8] = Position::Long;
        Self::new("Long Aug-Sep", months)
    }

    /// Parses a month map such as `"3:-1, 8:1, 9:1"`. Unlisted months are flat.
    pub fn parse(name: impl Into<String>, input: &str) -> Result<Self, SeasontraderError> {
        let mut months = [Position::Flat; 12];
        let mut seen = [false; 12];

        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (month_str, pos_str) =
                token
                    .split_once(':')
                    .ok_or_else(|| SeasontraderError::InvalidMonthMap {
                        reason: format!("expected month:position, got '{}'", token),
                    })?;

            let month: u32 =
                month_str
                    .trim()
                    .parse()
                    .map_err(|_| SeasontraderError::InvalidMonthMap {
                        reason: format!("invalid month '{}'", month_str.trim()),
                    })?;
            if !(1..=12).contains(&month) {
                return Err(SeasontraderError::InvalidMonthMap {
                    reason: format!("month {} out of range 1-12", month),
                });
            }

            let raw: i8 = pos_str
                .trim()
                .parse()
                .map_err(|_| SeasontraderError::InvalidMonthMap {
                    reason: format!("invalid position '{}'", pos_str.trim()),
                })?;
            let position =
                Position::try_from(raw).map_err(|v| SeasontraderError::InvalidMonthMap {
                    reason: format!("position {} for month {} must be -1, 0 or 1", v, month),
                })?;

            let idx = (month - 1) as usize;
            if seen[idx] {
                return Err(SeasontraderError::InvalidMonthMap {
                    reason: format!("duplicate month {}", month),
                });
            }
            seen[idx] = true;
            months[idx] = position;
        }

        Ok(Self::new(name, months))
    }

    /// Position for a 1-based calendar month; `None` outside 1..=12.
    pub fn position_for_month(&self, month: u32) -> Option<Position> {
        let idx = usize::try_from(month.checked_sub(1)?).ok()?;
        self.months.get(idx).copied()
    }
}

impl SignalFunction for MonthlySignal {
    fn signal(&self, date: NaiveDate) -> i8 {
        self.position_for_month(date.month()).map_or(0, Position::value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MonthlySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<String> = self
            .months
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_active())
            .map(|(i, p)| format!("{}:{}", i + 1, p.value()))
            .collect();
        if active.is_empty() {
            f.write_str("always flat")
        } else {
            f.write_str(&active.join(", "))
        }
    }
}

/// Evaluates `signal` on every observation date.
pub fn signal_series(
    observations: &[Observation],
    signal: &dyn SignalFunction,
) -> Result<Vec<Position>, SeasontraderError> {
    observations
        .iter()
        .map(|o| {
            let raw = signal.signal(o.date);
            Position::try_from(raw).map_err(|value| SeasontraderError::InvalidSignal {
                date: o.date,
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, 15).unwrap()
    }

    #[test]
    fn variant_a_months() {
        let s = MonthlySignal::short_march_long_late_summer();
        for m in 1..=12 {
            let expected = match m {
                3 => -1,
                8 | 9 => 1,
                _ => 0,
            };
            assert_eq!(s.signal(d(m)), expected, "month {}", m);
        }
    }

    #[test]
    fn variant_b_has_no_short_leg() {
        let s = MonthlySignal::long_late_summer();
        assert_eq!(s.signal(d(3)), 0);
        assert_eq!(s.signal(d(8)), 1);
        assert_eq!(s.signal(d(9)), 1);
        assert_eq!(s.signal(d(10)), 0);
    }

    #[test]
    fn position_for_month_out_of_range_is_none() {
        let s = MonthlySignal::short_march_long_late_summer();
        assert_eq!(s.position_for_month(0), None);
        assert_eq!(s.position_for_month(13), None);
        assert_eq!(s.position_for_month(u32::MAX), None);
        assert_eq!(s.position_for_month(3), Some(Position::Short));
        assert_eq!(s.position_for_month(12), Some(Position::Flat));
    }

    #[test]
    fn parse_matches_variant_a() {
        let parsed = MonthlySignal::parse("Short Mar, long Aug-Sep", "3:-1, 8:1, 9:1").unwrap();
        assert_eq!(parsed, MonthlySignal::short_march_long_late_summer());
    }

    #[test]
    fn parse_empty_is_always_flat() {
        let parsed = MonthlySignal::parse("flat", "").unwrap();
        assert_eq!(parsed.to_string(), "always flat");
        assert_eq!(parsed.signal(d(8)), 0);
    }

    #[test]
    fn parse_rejects_bad_month() {
        assert!(matches!(
            MonthlySignal::parse("x", "13:1"),
            Err(SeasontraderError::InvalidMonthMap { .. })
        ));
        assert!(MonthlySignal::parse("x", "0:1").is_err());
        assert!(MonthlySignal::parse("x", "may:1").is_err());
    }

    #[test]
    fn parse_rejects_bad_position() {
        assert!(MonthlySignal::parse("x", "3:2").is_err());
        assert!(MonthlySignal::parse("x", "3").is_err());
    }

    #[test]
    fn parse_rejects_duplicate_month() {
        assert!(MonthlySignal::parse("x", "8:1, 8:-1").is_err());
    }

    #[test]
    fn display_lists_active_months() {
        let s = MonthlySignal::short_march_long_late_summer();
        assert_eq!(s.to_string(), "3:-1, 8:1, 9:1");
    }

    #[test]
    fn closure_is_a_signal_function() {
        let always_long = |_: NaiveDate| 1i8;
        let obs = vec![Observation::new(d(1), 1.0), Observation::new(d(2), 1.1)];
        let series = signal_series(&obs, &always_long).unwrap();
        assert_eq!(series, vec![Position::Long, Position::Long]);
        assert_eq!(always_long.name(), "custom");
    }

    #[test]
    fn out_of_range_signal_rejected() {
        let broken = |date: NaiveDate| if date.month() == 2 { 2i8 } else { 0 };
        let obs = vec![Observation::new(d(1), 1.0), Observation::new(d(2), 1.1)];
        let err = signal_series(&obs, &broken).unwrap_err();
        assert!(matches!(
            err,
            SeasontraderError::InvalidSignal { value: 2, .. }
        ));
    }

    #[test]
    fn position_round_trip_values() {
        assert_eq!(Position::try_from(-1), Ok(Position::Short));
        assert_eq!(Position::try_from(5), Err(5));
        assert_eq!(Position::Long.as_f64(), 1.0);
        assert!(!Position::Flat.is_active());
    }
}
