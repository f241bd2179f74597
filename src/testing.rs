//! Test doubles shared by unit tests.

use std::sync::atomic::{AtomicU32, Ordering};

use ethers::types::{Address, I256, U256};

use crate::arbitrage::ProfitSource;
use crate::dex::QuoteGateway;
use crate::errors::Result;

/// Whole tokens in 18-decimal smallest units.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

/// Gateway answering from a closure and counting calls.
pub struct FnGateway<F> {
    quote: F,
    calls: AtomicU32,
}

impl<F> FnGateway<F>
where
    F: Fn(U256, Address, Address) -> Result<U256> + Send + Sync,
{
    pub fn new(quote: F) -> Self {
        Self {
            quote,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> QuoteGateway for FnGateway<F>
where
    F: Fn(U256, Address, Address) -> Result<U256> + Send + Sync,
{
    async fn quote_exact_input(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        _fee_tier: u32,
    ) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.quote)(amount_in, token_in, token_out)
    }
}

/// Profit curve given directly as a closure, recording every evaluated amount.
pub struct CurveSource<F> {
    curve: F,
    pub evaluated: Vec<U256>,
}

impl<F> CurveSource<F>
where
    F: FnMut(U256) -> Result<I256> + Send,
{
    pub fn new(curve: F) -> Self {
        Self {
            curve,
            evaluated: Vec::new(),
        }
    }
}

impl<F> ProfitSource for CurveSource<F>
where
    F: FnMut(U256) -> Result<I256> + Send,
{
    async fn profit(&mut self, amount_in: U256) -> Result<I256> {
        self.evaluated.push(amount_in);
        (self.curve)(amount_in)
    }
}
