use std::collections::HashMap;
use std::future::Future;

use ethers::types::{Address, I256, U256};
use tracing::debug;

use crate::dex::{FeeRatio, PoolSnapshot, QuoteGateway, quote_constant_product};
use crate::errors::{AppError, Result};
use crate::models::Direction;
use crate::utils::signed_difference;

/// Anything the search engine can ask for the profit at a given input amount.
pub trait ProfitSource {
    fn profit(&mut self, amount_in: U256) -> impl Future<Output = Result<I256>> + Send;
}

/// Tokens and constant-product reserves of one two-leg round trip, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Route {
    token_in: Address,
    token_mid: Address,
    /// `(reserve_in, reserve_out)` for the constant-product leg.
    cp_reserves: (U256, U256),
}

impl Route {
    fn resolve(snapshot: &PoolSnapshot, direction: Direction, token_in: Address) -> Result<Self> {
        let cp = &snapshot.constant_product;
        let cl = &snapshot.concentrated;
        let missing = |pool: &str| {
            AppError::InvalidConfiguration(format!(
                "token {token_in:?} is not traded by the {pool} pool"
            ))
        };

        let (token_mid, cp_reserves, token_out) = match direction {
            Direction::AToB => {
                let token_mid = cp.other(token_in).ok_or_else(|| missing("constant-product"))?;
                let reserves = cp.reserves_for(token_in)?;
                let token_out = cl.other(token_mid).ok_or_else(|| missing("concentrated"))?;
                (token_mid, reserves, token_out)
            }
            Direction::BToA => {
                let token_mid = cl.other(token_in).ok_or_else(|| missing("concentrated"))?;
                let reserves = cp.reserves_for(token_mid)?;
                let token_out = cp.other(token_mid).ok_or_else(|| missing("constant-product"))?;
                (token_mid, reserves, token_out)
            }
        };

        if token_out != token_in {
            return Err(AppError::InvalidConfiguration(format!(
                "route {direction} ends in {token_out:?} instead of {token_in:?}"
            )));
        }

        Ok(Self {
            token_in,
            token_mid,
            cp_reserves,
        })
    }
}

/// Profit of one round trip through both pools for a fixed snapshot and direction.
///
/// Pure for a given snapshot: the same amount always yields the same profit, so the
/// optional memo never changes a result.
pub struct ProfitEvaluator<'a, Q> {
    gateway: &'a Q,
    direction: Direction,
    route: Route,
    fee_tier: u32,
    v2_fee: FeeRatio,
    cache: Option<HashMap<U256, I256>>,
    quote_calls: u32,
}

impl<'a, Q: QuoteGateway + Sync> ProfitEvaluator<'a, Q> {
    pub fn new(
        snapshot: &PoolSnapshot,
        gateway: &'a Q,
        direction: Direction,
        token_in: Address,
        v2_fee: FeeRatio,
    ) -> Result<Self> {
        let route = Route::resolve(snapshot, direction, token_in)?;
        Ok(Self {
            gateway,
            direction,
            route,
            fee_tier: snapshot.concentrated.fee_tier,
            v2_fee,
            cache: None,
            quote_calls: 0,
        })
    }

    /// Remember profits by amount for the lifetime of this evaluator.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(HashMap::new());
        self
    }

    /// Remote quotes issued so far.
    pub fn quote_calls(&self) -> u32 {
        self.quote_calls
    }

    async fn round_trip(&mut self, amount_in: U256) -> Result<U256> {
        let Route {
            token_in,
            token_mid,
            cp_reserves: (reserve_in, reserve_out),
        } = self.route;

        match self.direction {
            Direction::AToB => {
                let mid = quote_constant_product(amount_in, reserve_in, reserve_out, self.v2_fee)?;
                self.quote_calls += 1;
                self.gateway
                    .quote_exact_input(mid, token_mid, token_in, self.fee_tier)
                    .await
            }
            Direction::BToA => {
                self.quote_calls += 1;
                let mid = self
                    .gateway
                    .quote_exact_input(amount_in, token_in, token_mid, self.fee_tier)
                    .await?;
                quote_constant_product(mid, reserve_in, reserve_out, self.v2_fee)
            }
        }
    }
}

impl<Q: QuoteGateway + Sync> ProfitSource for ProfitEvaluator<'_, Q> {
    async fn profit(&mut self, amount_in: U256) -> Result<I256> {
        if let Some(profit) = self.cache.as_ref().and_then(|c| c.get(&amount_in)) {
            return Ok(*profit);
        }

        let amount_out = self.round_trip(amount_in).await?;
        let profit = signed_difference(amount_out, amount_in)?;
        debug!(
            direction = %self.direction,
            amount_in = %amount_in,
            amount_out = %amount_out,
            profit = %profit,
            "[SEARCH] evaluated"
        );

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(amount_in, profit);
        }
        Ok(profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{ConcentratedPool, ConstantProductPool};
    use crate::testing::{FnGateway, tokens};

    const QUOTE: Address = Address::repeat_byte(0x11);
    const OTHER: Address = Address::repeat_byte(0x22);

    fn snapshot() -> PoolSnapshot {
        PoolSnapshot::new(
            ConstantProductPool {
                reserve0: tokens(1_000),
                reserve1: tokens(2_000),
                token0: QUOTE,
                token1: OTHER,
            },
            ConcentratedPool {
                sqrt_price_x96: U256::one() << 96,
                token0: QUOTE,
                token1: OTHER,
                fee_tier: 500,
            },
        )
    }

    #[tokio::test]
    async fn v2_first_sells_constant_product_output_into_quoter() {
        let snap = snapshot();
        let gateway = FnGateway::new(|amount, token_in, token_out| {
            assert_eq!((token_in, token_out), (OTHER, QUOTE));
            Ok(amount / 2)
        });
        let mut evaluator =
            ProfitEvaluator::new(&snap, &gateway, Direction::AToB, QUOTE, FeeRatio::default())
                .unwrap();

        let amount = tokens(10);
        let mid =
            quote_constant_product(amount, tokens(1_000), tokens(2_000), FeeRatio::default())
                .unwrap();
        let expected = signed_difference(mid / 2, amount).unwrap();
        assert_eq!(evaluator.profit(amount).await.unwrap(), expected);
        assert_eq!(evaluator.quote_calls(), 1);
    }

    #[tokio::test]
    async fn v3_first_sells_quoter_output_into_constant_product() {
        let snap = snapshot();
        let gateway = FnGateway::new(|amount, token_in, token_out| {
            assert_eq!((token_in, token_out), (QUOTE, OTHER));
            Ok(amount * 3)
        });
        let mut evaluator =
            ProfitEvaluator::new(&snap, &gateway, Direction::BToA, QUOTE, FeeRatio::default())
                .unwrap();

        let amount = tokens(10);
        let out =
            quote_constant_product(amount * 3, tokens(2_000), tokens(1_000), FeeRatio::default())
                .unwrap();
        let profit = evaluator.profit(amount).await.unwrap();
        assert_eq!(profit, signed_difference(out, amount).unwrap());
        assert!(profit.is_positive());
    }

    #[tokio::test]
    async fn same_amount_same_profit() {
        let snap = snapshot();
        let gateway = FnGateway::new(|amount, _, _| Ok(amount));
        let mut evaluator =
            ProfitEvaluator::new(&snap, &gateway, Direction::AToB, QUOTE, FeeRatio::default())
                .unwrap();
        let first = evaluator.profit(tokens(5)).await.unwrap();
        let second = evaluator.profit(tokens(5)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn cache_skips_repeated_remote_quotes() {
        let snap = snapshot();
        let gateway = FnGateway::new(|amount, _, _| Ok(amount));
        let mut evaluator =
            ProfitEvaluator::new(&snap, &gateway, Direction::AToB, QUOTE, FeeRatio::default())
                .unwrap()
                .with_cache();
        let first = evaluator.profit(tokens(5)).await.unwrap();
        let second = evaluator.profit(tokens(5)).await.unwrap();
        evaluator.profit(tokens(6)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.calls(), 2);
        assert_eq!(evaluator.quote_calls(), 2);
    }

    #[tokio::test]
    async fn gateway_errors_propagate() {
        let snap = snapshot();
        let gateway = FnGateway::new(|_, _, _| Err(AppError::Gateway("reverted".to_string())));
        let mut evaluator =
            ProfitEvaluator::new(&snap, &gateway, Direction::BToA, QUOTE, FeeRatio::default())
                .unwrap();
        assert!(matches!(
            evaluator.profit(tokens(1)).await,
            Err(AppError::Gateway(_))
        ));
    }

    #[test]
    fn unknown_token_is_rejected_up_front() {
        let snap = snapshot();
        let gateway = FnGateway::new(|amount, _, _| Ok(amount));
        let stranger = Address::repeat_byte(0x99);
        for direction in [Direction::AToB, Direction::BToA] {
            let result =
                ProfitEvaluator::new(&snap, &gateway, direction, stranger, FeeRatio::default());
            assert!(matches!(result, Err(AppError::InvalidConfiguration(_))));
        }
    }
}
