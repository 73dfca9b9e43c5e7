//! Strategy configuration and the reference presets.

use crate::domain::signal::MonthlySignal;
use crate::domain::stop_loss::StopLossOverlay;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub signal: MonthlySignal,
    pub stop_loss: Option<StopLossOverlay>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, signal: MonthlySignal) -> Self {
        Self {
            name: name.into(),
            signal,
            stop_loss: None,
        }
    }

    pub fn with_stop_loss(mut self, overlay: StopLossOverlay) -> Self {
        self.stop_loss = Some(overlay);
        self
    }

    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::A => Strategy::new(
                "Strategy A: short Mar, long Aug-Sep",
                MonthlySignal::short_march_long_late_summer(),
            ),
            Preset::B => Strategy::new(
                "Strategy B: long Aug-Sep",
                MonthlySignal::long_late_summer(),
            ),
            Preset::C => Strategy::new(
                "Strategy C: A with weekly stop loss",
                MonthlySignal::short_march_long_late_summer(),
            )
            .with_stop_loss(StopLossOverlay::default()),
        }
    }
}

/// Reference strategies reproduced by `compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    A,
    B,
    C,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::A, Preset::B, Preset::C];
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Preset::A),
            "b" => Ok(Preset::B),
            "c" => Ok(Preset::C),
            other => Err(format!("unknown preset '{}', expected a, b or c", other)),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::A => f.write_str("a"),
            Preset::B => f.write_str("b"),
            Preset::C => f.write_str("c"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::SignalFunction;
    use chrono::NaiveDate;

    #[test]
    fn presets_a_and_c_share_the_signal() {
        let a = Strategy::preset(Preset::A);
        let c = Strategy::preset(Preset::C);
        assert_eq!(a.signal, c.signal);
        assert!(a.stop_loss.is_none());
        assert_eq!(c.stop_loss, Some(StopLossOverlay::default()));
    }

    #[test]
    fn preset_b_is_long_only() {
        let b = Strategy::preset(Preset::B);
        let march = NaiveDate::from_ymd_opt(2023, 3, 10).unwrap();
        assert_eq!(b.signal.signal(march), 0);
        assert!(b.stop_loss.is_none());
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("A".parse::<Preset>(), Ok(Preset::A));
        assert_eq!(" c ".parse::<Preset>(), Ok(Preset::C));
        assert!("d".parse::<Preset>().is_err());
    }

    #[test]
    fn with_stop_loss_sets_overlay() {
        let overlay = StopLossOverlay::new(-0.01, 3).unwrap();
        let s = Strategy::new("x", MonthlySignal::long_late_summer()).with_stop_loss(overlay);
        assert_eq!(s.stop_loss, Some(overlay));
    }
}
