use std::fmt;
use std::str::FromStr;

use ethers::types::{Address, U256};

use crate::dex::FeeRatio;
use crate::errors::{AppError, Result};

/// How the engine walks the amount domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Forward stepping with a decaying step after the first profit decline.
    #[default]
    AdaptiveStepping,
    /// Interval halving driven by whether the midpoint improved the best profit.
    /// Assumes a unimodal profit curve.
    BisectionRefinement,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::AdaptiveStepping => f.write_str("adaptive"),
            SearchStrategy::BisectionRefinement => f.write_str("bisection"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" | "adaptive-stepping" | "stepping" => Ok(SearchStrategy::AdaptiveStepping),
            "bisection" | "bisection-refinement" => Ok(SearchStrategy::BisectionRefinement),
            other => Err(AppError::Config(format!(
                "unknown search strategy {other:?} (expected \"adaptive\" or \"bisection\")"
            ))),
        }
    }
}

/// Search domain, step schedule and budget for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub min_amount_in: U256,
    pub max_amount_in: U256,
    pub initial_step: U256,
    /// Percentage of the step kept at each decay (10 keeps a tenth).
    pub decay_percent: u8,
    /// Hard cap on profit evaluations.
    pub max_evaluations: u32,
    pub strategy: SearchStrategy,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.decay_percent == 0 || self.decay_percent >= 100 {
            return Err(AppError::InvalidConfiguration(format!(
                "decay_percent must be in (0, 100), got {}",
                self.decay_percent
            )));
        }
        if self.initial_step.is_zero() {
            return Err(AppError::InvalidConfiguration(
                "initial_step must be positive".to_string(),
            ));
        }
        if self.min_amount_in > self.max_amount_in {
            return Err(AppError::InvalidConfiguration(format!(
                "min_amount_in {} exceeds max_amount_in {}",
                self.min_amount_in, self.max_amount_in
            )));
        }
        if self.max_evaluations == 0 {
            return Err(AppError::InvalidConfiguration(
                "max_evaluations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a single direction search needs besides the pools and the quoter.
#[derive(Debug, Clone)]
pub struct ArbitrageConfig {
    /// Token the trade starts and ends in.
    pub token_in: Address,
    pub v2_fee: FeeRatio,
    pub search: SearchConfig,
    /// Memoize profits by amount so a repeated amount does not repeat the remote quote.
    pub cache_evaluations: bool,
}
