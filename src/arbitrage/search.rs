//! Bounded search for the input amount that maximizes round-trip profit.
//!
//! The profit curve is only sampled through a [`ProfitSource`]; every sample may be a
//! remote call, so both strategies keep the number of evaluations small and capped.

use std::time::Instant;

use ethers::types::{I256, U256};
use thiserror::Error;
use tracing::{debug, info};

use super::evaluator::ProfitSource;
use super::types::{SearchConfig, SearchStrategy};
use crate::errors::{AppError, Result};
use crate::models::{Candidate, SearchOutcome, TerminationReason};

/// A run that ended in an error.
///
/// `best_known` is the best point seen before the failure. It is a partial result and
/// must be reported as such, never as the outcome of the search.
#[derive(Debug, Error)]
#[error("search aborted after {evaluations} evaluations")]
pub struct SearchAborted {
    #[source]
    pub error: AppError,
    pub best_known: Option<Candidate>,
    pub evaluations: u32,
}

impl From<AppError> for SearchAborted {
    fn from(error: AppError) -> Self {
        Self {
            error,
            best_known: None,
            evaluations: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Expanding,
    Refining,
}

/// How one evaluation compares with the best seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Improved,
    /// Strictly below a positive best.
    Declined,
    Flat,
}

struct SearchState {
    best: Candidate,
    step: U256,
    phase: Phase,
    evaluations: u32,
    max_evaluations: u32,
    decay_percent: u8,
    started: Instant,
}

impl SearchState {
    fn new(config: &SearchConfig) -> Self {
        Self {
            best: Candidate {
                amount_in: config.min_amount_in,
                profit: I256::zero(),
            },
            step: config.initial_step,
            phase: Phase::Expanding,
            evaluations: 0,
            max_evaluations: config.max_evaluations,
            decay_percent: config.decay_percent,
            started: Instant::now(),
        }
    }

    fn budget_exhausted(&self) -> bool {
        self.evaluations >= self.max_evaluations
    }

    async fn observe<P: ProfitSource>(
        &mut self,
        source: &mut P,
        amount_in: U256,
    ) -> std::result::Result<Observation, SearchAborted> {
        let profit = match source.profit(amount_in).await {
            Ok(profit) => profit,
            Err(error) => return Err(self.abort(error)),
        };
        self.evaluations += 1;

        if profit > self.best.profit {
            self.best = Candidate { amount_in, profit };
            info!(
                amount_in = %amount_in,
                profit = %profit,
                evaluations = self.evaluations,
                "[SEARCH] potential profit increased"
            );
            Ok(Observation::Improved)
        } else if self.best.profit.is_positive() && profit < self.best.profit {
            Ok(Observation::Declined)
        } else {
            Ok(Observation::Flat)
        }
    }

    /// Shrink the step to `decay_percent` of itself. Returns `false` once it reaches zero.
    fn decay(&mut self) -> bool {
        let percent = U256::from(self.decay_percent);
        let hundred = U256::from(100u8);
        // floor(step * p / 100) without forming step * p
        self.step = self.step / hundred * percent + self.step % hundred * percent / hundred;
        debug!(step = %self.step, "[SEARCH] step decreased");
        !self.step.is_zero()
    }

    fn abort(&self, error: AppError) -> SearchAborted {
        SearchAborted {
            error,
            best_known: self.best.profit.is_positive().then_some(self.best),
            evaluations: self.evaluations,
        }
    }

    fn finish(self, termination: TerminationReason) -> SearchOutcome {
        let outcome = SearchOutcome {
            best_amount_in: self.best.amount_in,
            best_profit: self.best.profit,
            evaluations: self.evaluations,
            termination,
            elapsed: self.started.elapsed(),
        };
        info!(
            best_amount_in = %outcome.best_amount_in,
            best_profit = %outcome.best_profit,
            evaluations = outcome.evaluations,
            termination = ?termination,
            "[SEARCH] finished"
        );
        outcome
    }
}

/// Validated search configuration plus the strategy that walks it.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run one search against `source`.
    ///
    /// Evaluations never exceed `max_evaluations`. The returned future holds no
    /// resources between evaluations and can be dropped at any await point.
    pub async fn run<P: ProfitSource>(
        &self,
        source: &mut P,
    ) -> std::result::Result<SearchOutcome, SearchAborted> {
        let mut state = SearchState::new(&self.config);
        info!(
            strategy = %self.config.strategy,
            min = %self.config.min_amount_in,
            max = %self.config.max_amount_in,
            step = %self.config.initial_step,
            "[SEARCH] starting"
        );

        if self.config.min_amount_in == self.config.max_amount_in {
            state.observe(source, self.config.min_amount_in).await?;
            return Ok(state.finish(TerminationReason::DomainExhausted));
        }

        let termination = match self.config.strategy {
            SearchStrategy::AdaptiveStepping => self.adaptive_stepping(&mut state, source).await?,
            SearchStrategy::BisectionRefinement => {
                self.bisection_refinement(&mut state, source).await?
            }
        };
        Ok(state.finish(termination))
    }

    /// Step forward from `min` until the profit first declines, then step back once and
    /// walk the bracket again with a decayed step until the profit declines a second time.
    async fn adaptive_stepping<P: ProfitSource>(
        &self,
        state: &mut SearchState,
        source: &mut P,
    ) -> std::result::Result<TerminationReason, SearchAborted> {
        let max = self.config.max_amount_in;
        let mut cursor = self.config.min_amount_in;
        let mut previous: Option<U256> = None;

        loop {
            if state.budget_exhausted() {
                return Ok(TerminationReason::EvaluationBudget);
            }

            if state.observe(source, cursor).await? == Observation::Declined {
                match state.phase {
                    Phase::Expanding => {
                        let low = previous.unwrap_or(self.config.min_amount_in);
                        info!(
                            low = %low,
                            high = %cursor,
                            best_profit = %state.best.profit,
                            "[SEARCH] found best range"
                        );
                        state.phase = Phase::Refining;
                        if !state.decay() {
                            return Ok(TerminationReason::StepExhausted);
                        }
                        cursor = low;
                    }
                    Phase::Refining => return Ok(TerminationReason::Converged),
                }
            }

            if cursor >= max {
                return Ok(TerminationReason::DomainExhausted);
            }
            previous = Some(cursor);
            cursor = cursor.saturating_add(state.step).min(max);
        }
    }

    /// Halve `[low, high]` toward the side that improved the best profit. Each time the
    /// bracket narrows to the step, the step decays; a refining pass with no improvement
    /// ends the run.
    ///
    /// Only exact for unimodal curves. Concentrated liquidity makes the real curve
    /// piecewise, so this can settle on a local maximum. Midpoints never reach `min` or
    /// `max`, so a curve still rising at `max` is reported just below it.
    async fn bisection_refinement<P: ProfitSource>(
        &self,
        state: &mut SearchState,
        source: &mut P,
    ) -> std::result::Result<TerminationReason, SearchAborted> {
        let mut low = self.config.min_amount_in;
        let mut high = self.config.max_amount_in;

        loop {
            let mut improved = false;
            // a domain narrower than the step is still sampled once
            while high - low > state.step || state.evaluations == 0 {
                if state.budget_exhausted() {
                    return Ok(TerminationReason::EvaluationBudget);
                }
                let mid = low + (high - low) / 2;
                if state.observe(source, mid).await? == Observation::Improved {
                    improved = true;
                    low = mid;
                } else {
                    high = mid;
                }
            }

            match state.phase {
                Phase::Expanding => {
                    if !state.best.profit.is_positive() {
                        return Ok(TerminationReason::DomainExhausted);
                    }
                    info!(
                        low = %low,
                        high = %high,
                        best_profit = %state.best.profit,
                        "[SEARCH] found best range"
                    );
                    state.phase = Phase::Refining;
                }
                Phase::Refining if !improved => return Ok(TerminationReason::Converged),
                Phase::Refining => {}
            }

            if !state.decay() {
                return Ok(TerminationReason::StepExhausted);
            }
        }
    }
}
