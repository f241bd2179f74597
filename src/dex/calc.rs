use bigdecimal::BigDecimal;
use ethers::types::{Address, U256};
use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::errors::{AppError, Result};
use crate::utils::u256_to_bigint;

/// Places kept when spot prices are compared.
pub const SPOT_PRICE_PLACES: i64 = 8;

/// Fixed-point precision used for constant-product spot prices.
const PRICE_PRECISION_DECIMALS: usize = 18;

/// Proportional fee kept by a constant-product pool, as `numerator / denominator` of the
/// input that actually reaches the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRatio {
    pub numerator: u32,
    pub denominator: u32,
}

impl FeeRatio {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if denominator == 0 || numerator == 0 || numerator > denominator {
            return Err(AppError::InvalidConfiguration(format!(
                "fee ratio {numerator}/{denominator} must satisfy 0 < numerator <= denominator"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

impl Default for FeeRatio {
    /// Uniswap V2: 0.3% fee.
    fn default() -> Self {
        Self {
            numerator: 997,
            denominator: 1000,
        }
    }
}

/// Exact-input output of a constant-product pool.
///
/// `floor(amount_in * num * reserve_out / (reserve_in * den + amount_in * num))`
///
/// # Errors
/// * `InvalidReserves` if either reserve is zero
/// * `ArithmeticOverflow` if an intermediate product does not fit 256 bits
pub fn quote_constant_product(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
    fee: FeeRatio,
) -> Result<U256> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(AppError::InvalidReserves {
            reserve_in,
            reserve_out,
        });
    }
    if amount_in.is_zero() {
        return Ok(U256::zero());
    }

    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(fee.numerator))
        .ok_or(AppError::ArithmeticOverflow("amount_in * fee"))?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(AppError::ArithmeticOverflow("constant-product numerator"))?;
    let denominator = reserve_in
        .checked_mul(U256::from(fee.denominator))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(AppError::ArithmeticOverflow("constant-product denominator"))?;

    Ok(numerator / denominator)
}

/// Spot price of the non-quote token expressed in the quote token, read from
/// constant-product reserves and rounded to [`SPOT_PRICE_PLACES`].
///
/// Only used to decide which pool is cheaper; never feeds profit computation.
pub fn spot_price_constant_product(
    reserves: (U256, U256),
    token0: Address,
    quote_token: Address,
) -> Result<BigDecimal> {
    let (reserve0, reserve1) = reserves;
    let (reserve_quote, reserve_other) = if token0 == quote_token {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    };
    if reserve_quote.is_zero() || reserve_other.is_zero() {
        return Err(AppError::InvalidReserves {
            reserve_in: reserve_quote,
            reserve_out: reserve_other,
        });
    }

    let scaled = reserve_quote
        .checked_mul(U256::exp10(PRICE_PRECISION_DECIMALS))
        .ok_or(AppError::ArithmeticOverflow("spot price scaling"))?
        / reserve_other;

    Ok(BigDecimal::new(u256_to_bigint(scaled), PRICE_PRECISION_DECIMALS as i64)
        .round(SPOT_PRICE_PLACES))
}

/// Spot price implied by a `sqrtPriceX96` value, in the same orientation as
/// [`spot_price_constant_product`]: units of quote token per unit of the other token.
pub fn spot_price_from_sqrt(
    sqrt_price_x96: U256,
    token0: Address,
    quote_token: Address,
) -> Result<BigDecimal> {
    if sqrt_price_x96.is_zero() {
        return Err(AppError::InvalidPoolState(
            "sqrtPriceX96 is zero".to_string(),
        ));
    }

    let sqrt = u256_to_bigint(sqrt_price_x96);
    let q192 = BigInt::one() << 192u32;
    // token1 per token0
    let price = BigDecimal::from(&sqrt * &sqrt) / BigDecimal::from(q192);
    let oriented = if token0 == quote_token {
        if price.is_zero() {
            return Err(AppError::InvalidPoolState(
                "sqrtPriceX96 too small to invert".to_string(),
            ));
        }
        BigDecimal::one() / price
    } else {
        price
    };

    Ok(oriented.round(SPOT_PRICE_PLACES))
}
