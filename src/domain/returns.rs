//! Return compounding.
//!
//! daily[i]    = close[i] / close[i-1] - 1        (undefined at 0)
//! strategy[i] = signal[i] * daily[i]             (undefined at 0)
//! wealth[i]   = wealth[i-1] * (1 + strategy[i]), wealth[0] = 1.0
//!
//! The signal applies on the same day as the return it multiplies.

use crate::domain::error::SeasontraderError;
use crate::domain::observation::Observation;
use crate::domain::signal::Position;

pub const MIN_OBSERVATIONS: usize = 2;

/// The three series produced by one compounding pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundedSeries {
    pub daily_returns: Vec<Option<f64>>,
    pub strategy_returns: Vec<Option<f64>>,
    pub wealth: Vec<f64>,
}

impl CompoundedSeries {
    pub fn final_wealth(&self) -> f64 {
        self.wealth.last().copied().unwrap_or(1.0)
    }
}

pub fn daily_returns(observations: &[Observation]) -> Result<Vec<Option<f64>>, SeasontraderError> {
    if observations.len() < MIN_OBSERVATIONS {
        return Err(SeasontraderError::InsufficientData {
            operation: "daily returns",
            have: observations.len(),
            need: MIN_OBSERVATIONS,
        });
    }

    let mut returns = Vec::with_capacity(observations.len());
    returns.push(None);
    returns.extend(
        observations
            .windows(2)
            .map(|w| Some(w[1].close / w[0].close - 1.0)),
    );
    Ok(returns)
}

pub fn strategy_returns(
    daily: &[Option<f64>],
    signals: &[Position],
) -> Result<Vec<Option<f64>>, SeasontraderError> {
    if daily.len() != signals.len() {
        return Err(SeasontraderError::MisalignedSeries {
            expected: daily.len(),
            actual: signals.len(),
        });
    }

    Ok(daily
        .iter()
        .zip(signals)
        .map(|(r, s)| r.map(|r| s.as_f64() * r))
        .collect())
}

/// Cumulative product of `1 + r`, seeded at 1.0. Undefined returns leave
/// wealth unchanged.
pub fn cumulative_wealth(strategy_returns: &[Option<f64>]) -> Vec<f64> {
    strategy_returns
        .iter()
        .scan(1.0_f64, |wealth, r| {
            if let Some(r) = r {
                *wealth *= 1.0 + r;
            }
            Some(*wealth)
        })
        .collect()
}

pub fn compound(
    observations: &[Observation],
    signals: &[Position],
) -> Result<CompoundedSeries, SeasontraderError> {
    let daily = daily_returns(observations)?;
    let strategy = strategy_returns(&daily, signals)?;
    let wealth = cumulative_wealth(&strategy);
    Ok(CompoundedSeries {
        daily_returns: daily,
        strategy_returns: strategy,
        wealth,
    })
}
