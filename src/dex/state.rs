use ethers::types::{Address, U256};

use crate::errors::{AppError, Result};

/// Reserves and token order of a constant-product (Uniswap V2 style) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantProductPool {
    pub reserve0: U256,
    pub reserve1: U256,
    pub token0: Address,
    pub token1: Address,
}

impl ConstantProductPool {
    pub fn reserves(&self) -> (U256, U256) {
        (self.reserve0, self.reserve1)
    }

    /// The token on the other side of `token`, if `token` belongs to the pair.
    pub fn other(&self, token: Address) -> Option<Address> {
        other_token(self.token0, self.token1, token)
    }

    /// `(reserve_in, reserve_out)` for a swap that sells `token_in`.
    pub fn reserves_for(&self, token_in: Address) -> Result<(U256, U256)> {
        if token_in == self.token0 {
            Ok((self.reserve0, self.reserve1))
        } else if token_in == self.token1 {
            Ok((self.reserve1, self.reserve0))
        } else {
            Err(AppError::InvalidConfiguration(format!(
                "token {token_in:?} is not part of the constant-product pair"
            )))
        }
    }
}

/// Price state of a concentrated-liquidity (Uniswap V3 style) pool.
///
/// Only the spot price lives here; exact outputs always come from the quoter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConcentratedPool {
    /// Current sqrt(price1/price0) in Q96 (`slot0.sqrtPriceX96`).
    pub sqrt_price_x96: U256,
    pub token0: Address,
    pub token1: Address,
    /// Fee tier in hundredths of a basis point (3000 = 0.30%).
    pub fee_tier: u32,
}

impl ConcentratedPool {
    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    pub fn other(&self, token: Address) -> Option<Address> {
        other_token(self.token0, self.token1, token)
    }
}

/// Immutable snapshot of both pools, fetched once per run.
///
/// Reserves are not refreshed while a search runs, so results can go stale on a busy pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub constant_product: ConstantProductPool,
    pub concentrated: ConcentratedPool,
}

impl PoolSnapshot {
    pub fn new(constant_product: ConstantProductPool, concentrated: ConcentratedPool) -> Self {
        Self {
            constant_product,
            concentrated,
        }
    }

    /// Replace the on-chain fee tier with an explicitly configured one.
    pub fn with_fee_tier(mut self, fee_tier: u32) -> Self {
        self.concentrated.fee_tier = fee_tier;
        self
    }
}

fn other_token(token0: Address, token1: Address, token: Address) -> Option<Address> {
    if token == token0 {
        Some(token1)
    } else if token == token1 {
        Some(token0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> ConstantProductPool {
        ConstantProductPool {
            reserve0: U256::from(10u64),
            reserve1: U256::from(20u64),
            token0: Address::from([0x11; 20]),
            token1: Address::from([0x22; 20]),
        }
    }

    #[test]
    fn reserves_follow_the_sold_token() {
        let pair = pair();
        assert_eq!(
            pair.reserves_for(pair.token0).unwrap(),
            (U256::from(10u64), U256::from(20u64))
        );
        assert_eq!(
            pair.reserves_for(pair.token1).unwrap(),
            (U256::from(20u64), U256::from(10u64))
        );
        assert!(pair.reserves_for(Address::from([0x33; 20])).is_err());
    }

    #[test]
    fn other_token_lookup() {
        let pair = pair();
        assert_eq!(pair.other(pair.token0), Some(pair.token1));
        assert_eq!(pair.other(Address::zero()), None);
    }
}
