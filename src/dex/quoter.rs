//! Remote exact-input quotes from the concentrated-liquidity pool.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ethers::{
    contract::{ContractError, abigen},
    providers::{Http, Provider},
    types::{Address, U256},
};
use tracing::warn;

use crate::errors::{AppError, Result};

abigen!(
    QuoterV2,
    r#"[
      {
        "type": "function",
        "name": "quoteExactInputSingle",
        "stateMutability": "nonpayable",
        "inputs": [
          {
            "name": "params",
            "type": "tuple",
            "components": [
              {"name": "tokenIn", "type": "address"},
              {"name": "tokenOut", "type": "address"},
              {"name": "amountIn", "type": "uint256"},
              {"name": "fee", "type": "uint24"},
              {"name": "sqrtPriceLimitX96", "type": "uint160"}
            ]
          }
        ],
        "outputs": [
          {"name": "amountOut", "type": "uint256"},
          {"name": "sqrtPriceX96After", "type": "uint160"},
          {"name": "initializedTicksCrossed", "type": "uint32"},
          {"name": "gasEstimate", "type": "uint256"}
        ]
      }
    ]"#
);

/// Black-box oracle returning the exact output of a hypothetical single-pool swap.
pub trait QuoteGateway {
    fn quote_exact_input(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
    ) -> impl Future<Output = Result<U256>> + Send;
}

impl<Q: QuoteGateway + Sync> QuoteGateway for &Q {
    fn quote_exact_input(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
    ) -> impl Future<Output = Result<U256>> + Send {
        (**self).quote_exact_input(amount_in, token_in, token_out, fee_tier)
    }
}

/// Uniswap V3 QuoterV2 reached through `eth_call`.
#[derive(Clone)]
pub struct UniswapV3Quoter {
    quoter: QuoterV2<Provider<Http>>,
}

impl UniswapV3Quoter {
    pub fn with_provider(provider: Arc<Provider<Http>>, quoter_addr: Address) -> Self {
        Self {
            quoter: QuoterV2::new(quoter_addr, provider),
        }
    }
}

impl QuoteGateway for UniswapV3Quoter {
    async fn quote_exact_input(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
    ) -> Result<U256> {
        // no price limit, like the router's default single-hop quote
        let params = (token_in, token_out, amount_in, fee_tier, U256::zero());
        let (amount_out, _, _, _) = self
            .quoter
            .quote_exact_input_single(params)
            .call()
            .await
            .map_err(quote_error)?;
        Ok(amount_out)
    }
}

/// A revert is the pool's answer for these inputs; anything else may be the transport.
fn quote_error(e: ContractError<Provider<Http>>) -> AppError {
    if matches!(e, ContractError::Revert(_)) {
        AppError::QuoteReverted(e.to_string())
    } else {
        AppError::Gateway(e.to_string())
    }
}

/// Timeout and retry limits applied at the gateway boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Wraps a gateway so that every call is bounded in time and retried a finite number of
/// times. The last failure is returned unchanged.
#[derive(Clone)]
pub struct GuardedQuoter<Q> {
    inner: Q,
    policy: GatewayPolicy,
}

impl<Q> GuardedQuoter<Q> {
    pub fn new(inner: Q, policy: GatewayPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<Q: QuoteGateway + Sync> QuoteGateway for GuardedQuoter<Q> {
    async fn quote_exact_input(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
    ) -> Result<U256> {
        let mut attempt = 0u32;
        loop {
            let call = self
                .inner
                .quote_exact_input(amount_in, token_in, token_out, fee_tier);
            let result = match tokio::time::timeout(self.policy.timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(AppError::GatewayTimeout(self.policy.timeout)),
            };

            match result {
                Ok(amount_out) => return Ok(amount_out),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        error = %e,
                        "[QUOTER] quote failed, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
