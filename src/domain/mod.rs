//! Core domain types and logic.

pub mod observation;
pub mod signal;
pub mod returns;
pub mod stop_loss;
pub mod metrics;
pub mod strategy;
pub mod backtest;
pub mod seasonality;
pub mod config_validation;
pub mod error;
