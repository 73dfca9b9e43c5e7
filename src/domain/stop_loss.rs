//! Trailing-performance stop-loss overlay.
//!
//! change[i]    = wealth[i] / wealth[i-lag] - 1   (undefined for i < lag)
//! flag[i]      = 0 if change[i] <= threshold else 1
//! effective[i] = base[i] * flag[i-1]             (effective[0] = base[0])
//!
//! The flag settles one observation after the breach is seen.

use crate::domain::error::SeasontraderError;
use crate::domain::observation::Observation;
use crate::domain::returns::{self, CompoundedSeries};
use crate::domain::signal::Position;
use tracing::{debug, warn};

pub const DEFAULT_THRESHOLD: f64 = -0.00375;
pub const DEFAULT_LAG: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLossOverlay {
    threshold: f64,
    lag: usize,
}

/// Both compounding passes of an overlaid run.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOutcome {
    pub base_signals: Vec<Position>,
    pub base: CompoundedSeries,
    pub trailing_change: Vec<Option<f64>>,
    pub flags: Vec<bool>,
    pub effective_signals: Vec<Position>,
    pub overlaid: CompoundedSeries,
}

impl OverlayOutcome {
    /// Observations the overlay actually flattened. A breach on the last
    /// observation, or one followed by a flat base day, flattens nothing.
    pub fn suppressed_days(&self) -> usize {
        self.base_signals
            .iter()
            .zip(&self.effective_signals)
            .filter(|(base, effective)| base != effective)
            .count()
    }
}

impl StopLossOverlay {
    pub fn new(threshold: f64, lag: usize) -> Result<Self, SeasontraderError> {
        if !threshold.is_finite() || threshold > 0.0 {
            return Err(SeasontraderError::InvalidThreshold { value: threshold });
        }
        if lag == 0 {
            return Err(SeasontraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "stop_loss_lag".into(),
                reason: "lag must be at least 1".into(),
            });
        }
        Ok(Self { threshold, lag })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Window-over-window percentage change of a wealth curve.
    pub fn trailing_change(&self, wealth: &[f64]) -> Vec<Option<f64>> {
        (0..wealth.len())
            .map(|i| {
                if i < self.lag {
                    return None;
                }
                let prev = wealth[i - self.lag];
                if prev == 0.0 {
                    None
                } else {
                    Some(wealth[i] / prev - 1.0)
                }
            })
            .collect()
    }

    /// `true` keeps trading, `false` suppresses the following observation.
    pub fn flags(&self, trailing_change: &[Option<f64>]) -> Vec<bool> {
        trailing_change
            .iter()
            .map(|c| !matches!(c, Some(c) if *c <= self.threshold))
            .collect()
    }

    /// Applies the flags to the base signal with a one-observation lag.
    pub fn effective_signals(&self, base: &[Position], flags: &[bool]) -> Vec<Position> {
        base.iter()
            .enumerate()
            .map(|(i, &position)| {
                let active = i == 0 || flags.get(i - 1).copied().unwrap_or(true);
                if active { position } else { Position::Flat }
            })
            .collect()
    }

    /// Runs the base pass, derives the effective signal and compounds it
    /// again. The base pass is returned unchanged.
    pub fn apply(
        &self,
        observations: &[Observation],
        base_signals: &[Position],
    ) -> Result<OverlayOutcome, SeasontraderError> {
        let base = returns::compound(observations, base_signals)?;

        if observations.len() <= self.lag {
            warn!(
                observations = observations.len(),
                lag = self.lag,
                "too few observations for the stop-loss window; overlay never triggers"
            );
        }

        let trailing_change = self.trailing_change(&base.wealth);
        let flags = self.flags(&trailing_change);
        let effective_signals = self.effective_signals(base_signals, &flags);
        let overlaid = returns::compound(observations, &effective_signals)?;

        let outcome = OverlayOutcome {
            base_signals: base_signals.to_vec(),
            base,
            trailing_change,
            flags,
            effective_signals,
            overlaid,
        };
        debug!(
            threshold = self.threshold,
            lag = self.lag,
            suppressed = outcome.suppressed_days(),
            "stop-loss overlay applied"
        );
        Ok(outcome)
    }
}

impl Default for StopLossOverlay {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            lag: DEFAULT_LAG,
        }
    }
}
