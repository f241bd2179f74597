//! Shared data structures used throughout the application.

use std::fmt;
use std::time::Duration;

use ethers::types::{I256, U256};
use serde::Serialize;

use crate::utils::{format_amount, format_profit};

/// Which pool the arbitrage starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Buy on the constant-product pool, sell through the concentrated-liquidity quoter.
    AToB,
    /// Buy through the concentrated-liquidity quoter, sell on the constant-product pool.
    BToA,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::AToB => Direction::BToA,
            Direction::BToA => Direction::AToB,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AToB => f.write_str("v2 -> v3"),
            Direction::BToA => f.write_str("v3 -> v2"),
        }
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    /// A refining pass saw the profit decline again (or failed to improve).
    Converged,
    /// The domain maximum was reached. The best may sit on the boundary or be zero.
    DomainExhausted,
    /// The step decayed to zero before the refining pass could finish.
    StepExhausted,
    /// The hard evaluation cap was hit.
    EvaluationBudget,
    /// Both pools quote the same spot price; nothing was evaluated.
    NoPriceDifference,
}

/// One evaluated point of the profit curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub amount_in: U256,
    pub profit: I256,
}

/// Result of one engine run, independent of how the profit was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best_amount_in: U256,
    pub best_profit: I256,
    pub evaluations: u32,
    pub termination: TerminationReason,
    pub elapsed: Duration,
}

/// Final record handed to reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub direction: Option<Direction>,
    pub best_amount_in: U256,
    pub best_profit: I256,
    pub evaluations: u32,
    pub termination: TerminationReason,
    pub elapsed: Duration,
}

impl SearchReport {
    pub fn from_outcome(direction: Direction, outcome: SearchOutcome) -> Self {
        Self {
            direction: Some(direction),
            best_amount_in: outcome.best_amount_in,
            best_profit: outcome.best_profit,
            evaluations: outcome.evaluations,
            termination: outcome.termination,
            elapsed: outcome.elapsed,
        }
    }

    /// Report for a snapshot whose spot prices are identical.
    pub fn no_price_difference(min_amount_in: U256, elapsed: Duration) -> Self {
        Self {
            direction: None,
            best_amount_in: min_amount_in,
            best_profit: I256::zero(),
            evaluations: 0,
            termination: TerminationReason::NoPriceDifference,
            elapsed,
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.best_profit.is_positive()
    }

    pub fn summary(&self, decimals: u32) -> ReportSummary {
        ReportSummary {
            direction: self.direction.map(|d| d.to_string()),
            best_amount_in: format_amount(self.best_amount_in, decimals),
            best_profit: format_profit(self.best_profit, decimals),
            best_amount_in_raw: self.best_amount_in.to_string(),
            best_profit_raw: self.best_profit.to_string(),
            evaluations: self.evaluations,
            termination: self.termination,
            elapsed_ms: self.elapsed.as_millis(),
            profitable: self.is_profitable(),
        }
    }
}

/// Human-readable view of a [`SearchReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub direction: Option<String>,
    pub best_amount_in: String,
    pub best_profit: String,
    pub best_amount_in_raw: String,
    pub best_profit_raw: String,
    pub evaluations: u32,
    pub termination: TerminationReason,
    pub elapsed_ms: u128,
    pub profitable: bool,
}
