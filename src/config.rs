//! Configuration loader and application settings.

use std::str::FromStr;
use std::time::Duration;

use ethers::types::{Address, U256};

use crate::arbitrage::{ArbitrageConfig, SearchConfig, SearchStrategy};
use crate::dex::{FeeRatio, GatewayPolicy};
use crate::errors::{AppError, Result};
use crate::utils::parse_amount;

/// 10^77 is the largest power of ten a `U256` holds.
const MAX_TOKEN_DECIMALS: u32 = 77;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// RPC endpoint for the Ethereum-compatible node.
    pub rpc_url: String,
    /// Uniswap V2 style pair.
    pub v2_pair: Address,
    /// Uniswap V3 pool quoting the same two tokens.
    pub v3_pool: Address,
    /// QuoterV2 contract used for exact V3 outputs.
    pub quoter: Address,
    /// Decimals of `arbitrage.token_in`, used for amounts given in whole tokens.
    pub token_decimals: u32,
    /// Overrides the fee tier read from the pool.
    pub v3_fee_tier: Option<u32>,
    pub arbitrage: ArbitrageConfig,
    pub gateway: GatewayPolicy,
    /// Search both directions instead of only the one spot prices favour.
    pub scan_both_directions: bool,
    /// Print the final report as JSON on stdout.
    pub report_json: bool,
}

impl AppConfig {
    /// Load configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let rpc_url = vars.required("RPC_URL")?;
        let v2_pair = vars.address("V2_PAIR_ADDRESS")?;
        let v3_pool = vars.address("V3_POOL_ADDRESS")?;
        let quoter = vars.address("QUOTER_ADDRESS")?;
        let token_in = vars.address("TOKEN_IN")?;

        let token_decimals: u32 = vars.parsed_or("TOKEN_DECIMALS", 18)?;
        if token_decimals > MAX_TOKEN_DECIMALS {
            return Err(AppError::Config(format!(
                "TOKEN_DECIMALS must be at most {MAX_TOKEN_DECIMALS}, got {token_decimals}"
            )));
        }
        let amount = |key: &str, default: &str| -> Result<U256> {
            let raw = vars.get(key).unwrap_or_else(|| default.to_string());
            parse_amount(&raw, token_decimals).map_err(|e| AppError::Config(format!("{key}: {e}")))
        };
        let search = SearchConfig {
            min_amount_in: amount("MIN_AMOUNT", "10000")?,
            max_amount_in: amount("MAX_AMOUNT", "5000000")?,
            initial_step: amount("STEP", "10000")?,
            decay_percent: vars.parsed_or("DECAY_PERCENT", 10)?,
            max_evaluations: vars.parsed_or("MAX_EVALUATIONS", 2_000)?,
            strategy: vars.parsed_or("SEARCH_STRATEGY", SearchStrategy::default())?,
        };
        search.validate()?;

        let v2_fee = FeeRatio::new(
            vars.parsed_or("V2_FEE_NUMERATOR", 997)?,
            vars.parsed_or("V2_FEE_DENOMINATOR", 1_000)?,
        )?;

        let gateway = GatewayPolicy {
            timeout: Duration::from_millis(vars.parsed_or("QUOTE_TIMEOUT_MS", 10_000)?),
            max_retries: vars.parsed_or("QUOTE_MAX_RETRIES", 2)?,
            retry_delay: Duration::from_millis(vars.parsed_or("QUOTE_RETRY_DELAY_MS", 250)?),
        };
        if gateway.timeout.is_zero() {
            return Err(AppError::Config("QUOTE_TIMEOUT_MS must be positive".to_string()));
        }

        Ok(Self {
            rpc_url,
            v2_pair,
            v3_pool,
            quoter,
            token_decimals,
            v3_fee_tier: vars.parsed_opt("V3_FEE_TIER")?,
            arbitrage: ArbitrageConfig {
                token_in,
                v2_fee,
                search,
                cache_evaluations: vars.flag("CACHE_EVALUATIONS")?,
            },
            gateway,
            scan_both_directions: vars.flag("SCAN_BOTH_DIRECTIONS")?,
            report_json: vars.flag("REPORT_JSON")?,
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Unset and blank values are treated alike.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| AppError::Config(format!("Set {key} env var")))
    }

    fn address(&self, key: &str) -> Result<Address> {
        let raw = self.required(key)?;
        raw.parse()
            .map_err(|e| AppError::Config(format!("{key} is not a valid address ({raw}): {e}")))
    }

    fn parsed_opt<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}")))
            })
            .transpose()
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parsed_opt(key)?.unwrap_or(default))
    }

    fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("0" | "false" | "no" | "off") => Ok(false),
            Some("1" | "true" | "yes" | "on") => Ok(true),
            Some(other) => Err(AppError::Config(format!(
                "{key} must be a boolean, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("RPC_URL", "http://localhost:8545"),
            ("V2_PAIR_ADDRESS", "0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc"),
            ("V3_POOL_ADDRESS", "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640"),
            ("QUOTER_ADDRESS", "0x61fFE014bA17989E743c5F6cB21bF9697530B21e"),
            ("TOKEN_IN", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&base()).unwrap();
        let search = &cfg.arbitrage.search;
        assert_eq!(search.min_amount_in, U256::from(10_000u64) * U256::exp10(18));
        assert_eq!(search.max_amount_in, U256::from(5_000_000u64) * U256::exp10(18));
        assert_eq!(search.initial_step, U256::from(10_000u64) * U256::exp10(18));
        assert_eq!(search.decay_percent, 10);
        assert_eq!(search.max_evaluations, 2_000);
        assert_eq!(search.strategy, SearchStrategy::AdaptiveStepping);
        assert_eq!(cfg.arbitrage.v2_fee, FeeRatio::default());
        assert_eq!(cfg.gateway, GatewayPolicy::default());
        assert_eq!(cfg.v3_fee_tier, None);
        assert!(!cfg.arbitrage.cache_evaluations);
        assert!(!cfg.scan_both_directions);
        assert!(!cfg.report_json);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = base();
        vars.extend([
            ("TOKEN_DECIMALS", "6"),
            ("MIN_AMOUNT", "0.5"),
            ("MAX_AMOUNT", "100"),
            ("STEP", "2.25"),
            ("SEARCH_STRATEGY", "bisection"),
            ("V3_FEE_TIER", "500"),
            ("CACHE_EVALUATIONS", "true"),
            ("QUOTE_TIMEOUT_MS", "1500"),
        ]);
        let cfg = load(&vars).unwrap();
        let search = &cfg.arbitrage.search;
        assert_eq!(search.min_amount_in, U256::from(500_000u64));
        assert_eq!(search.max_amount_in, U256::from(100_000_000u64));
        assert_eq!(search.initial_step, U256::from(2_250_000u64));
        assert_eq!(search.strategy, SearchStrategy::BisectionRefinement);
        assert_eq!(cfg.v3_fee_tier, Some(500));
        assert!(cfg.arbitrage.cache_evaluations);
        assert_eq!(cfg.gateway.timeout, Duration::from_millis(1_500));
    }

    #[test]
    fn missing_required_values_fail() {
        let mut vars = base();
        vars.remove("QUOTER_ADDRESS");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("QUOTER_ADDRESS"));
    }

    #[test]
    fn malformed_values_fail() {
        for (key, value) in [
            ("TOKEN_IN", "not-an-address"),
            ("MIN_AMOUNT", "-5"),
            ("DECAY_PERCENT", "ten"),
            ("REPORT_JSON", "maybe"),
            ("V2_FEE_NUMERATOR", "1001"),
        ] {
            let mut vars = base();
            vars.insert(key, value);
            assert!(load(&vars).is_err(), "{key}={value} should be rejected");
        }
    }

    #[test]
    fn token_decimals_beyond_u256_range_are_rejected() {
        let mut vars = base();
        vars.extend([("TOKEN_DECIMALS", "78"), ("MIN_AMOUNT", "0"), ("STEP", "1")]);
        assert!(matches!(load(&vars), Err(AppError::Config(msg)) if msg.contains("TOKEN_DECIMALS")));

        vars.extend([("TOKEN_DECIMALS", "77"), ("MAX_AMOUNT", "1")]);
        assert_eq!(load(&vars).unwrap().token_decimals, 77);
    }

    #[test]
    fn search_bounds_are_validated() {
        let mut vars = base();
        vars.extend([("MIN_AMOUNT", "10"), ("MAX_AMOUNT", "5")]);
        assert!(matches!(
            load(&vars),
            Err(AppError::InvalidConfiguration(_))
        ));
    }
}
