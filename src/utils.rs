//! Miscellaneous helper utilities.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use ethers::types::{I256, U256};
use num_bigint::{BigInt, Sign};
use tracing_subscriber::{EnvFilter, fmt};

use crate::errors::{AppError, Result};

/// Places shown when an amount or profit is rendered for humans.
pub const DISPLAY_PLACES: u32 = 8;

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Parse a human decimal string ("10000", "0.25") into smallest units.
///
/// Fails when the value is negative or has more fractional digits than `decimals`.
pub fn parse_amount(value: &str, decimals: u32) -> Result<U256> {
    let parsed = BigDecimal::from_str(value.trim())
        .map_err(|e| AppError::Config(format!("invalid amount {value:?}: {e}")))?;
    let scaled = parsed * BigDecimal::from(BigInt::from(10u8).pow(decimals));
    let integral = scaled.with_scale(0);
    if integral != scaled {
        return Err(AppError::Config(format!(
            "amount {value:?} has more than {decimals} fractional digits"
        )));
    }
    let (raw, _) = integral.into_bigint_and_exponent();
    if raw.sign() == Sign::Minus {
        return Err(AppError::Config(format!("amount {value:?} is negative")));
    }
    U256::from_dec_str(&raw.to_string())
        .map_err(|e| AppError::Config(format!("amount {value:?} does not fit 256 bits: {e}")))
}

/// Render smallest units as a decimal with [`DISPLAY_PLACES`] places, rounding half up.
pub fn format_amount(amount: U256, decimals: u32) -> String {
    let places = DISPLAY_PLACES;
    let rounded = if decimals >= places {
        let divisor = U256::exp10((decimals - places) as usize);
        let half = divisor / 2;
        amount.saturating_add(half) / divisor
    } else {
        amount.saturating_mul(U256::exp10((places - decimals) as usize))
    };
    let unit = U256::exp10(places as usize);
    format!(
        "{}.{:0>width$}",
        rounded / unit,
        (rounded % unit).to_string(),
        width = places as usize
    )
}

/// Signed counterpart of [`format_amount`].
pub fn format_profit(profit: I256, decimals: u32) -> String {
    let magnitude = format_amount(profit.unsigned_abs(), decimals);
    if profit.is_negative() {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

/// Exact conversion of a 256-bit unsigned integer into a `BigInt`.
pub fn u256_to_bigint(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

/// Lossless signed difference `minuend - subtrahend`.
pub fn signed_difference(minuend: U256, subtrahend: U256) -> Result<I256> {
    let minuend =
        I256::try_from(minuend).map_err(|_| AppError::ArithmeticOverflow("signed amount"))?;
    let subtrahend =
        I256::try_from(subtrahend).map_err(|_| AppError::ArithmeticOverflow("signed amount"))?;
    minuend
        .checked_sub(subtrahend)
        .ok_or(AppError::ArithmeticOverflow("profit"))
}
