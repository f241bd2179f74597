use std::sync::Arc;

use ethers::{
    contract::abigen,
    providers::{Http, Provider},
    types::{Address, U256},
};
use tracing::info;

use crate::dex::state::{ConcentratedPool, ConstantProductPool, PoolSnapshot};
use crate::errors::{AppError, Result};

abigen!(
    UniswapV2Pair,
    r"[
        function getReserves() view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        function token0() view returns (address)
        function token1() view returns (address)
    ]",
);

abigen!(
    UniswapV3Pool,
    r"[
        function slot0() view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
        function token0() view returns (address)
        function token1() view returns (address)
        function fee() view returns (uint24)
    ]",
);

/// Read-only handle on the two pools being compared.
#[derive(Clone)]
pub struct PoolReader {
    provider: Arc<Provider<Http>>,
    pair: UniswapV2Pair<Provider<Http>>,
    pool: UniswapV3Pool<Provider<Http>>,
}

impl PoolReader {
    pub async fn new(rpc_url: &str, pair_addr: Address, pool_addr: Address) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AppError::Config(format!("invalid RPC url {rpc_url:?}: {e}")))?;
        let provider = Arc::new(provider);
        let pair = UniswapV2Pair::new(pair_addr, provider.clone());
        let pool = UniswapV3Pool::new(pool_addr, provider.clone());
        // sanity-check both addresses before any search starts
        let (reserves, slot0) = (pair.get_reserves(), pool.slot_0());
        futures::try_join!(reserves.call(), slot0.call())?;
        Ok(Self {
            provider,
            pair,
            pool,
        })
    }

    /// Provider shared with the quoter so both use one HTTP client.
    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    /// Fetch reserves, sqrt price, token order and fee tier in one go.
    pub async fn snapshot(&self) -> Result<PoolSnapshot> {
        let pair_calls = (self.pair.get_reserves(), self.pair.token_0(), self.pair.token_1());
        let pool_calls = (
            self.pool.slot_0(),
            self.pool.token_0(),
            self.pool.token_1(),
            self.pool.fee(),
        );
        let (reserves, pair_token0, pair_token1, slot0, pool_token0, pool_token1, fee) = futures::try_join!(
            pair_calls.0.call(),
            pair_calls.1.call(),
            pair_calls.2.call(),
            pool_calls.0.call(),
            pool_calls.1.call(),
            pool_calls.2.call(),
            pool_calls.3.call(),
        )?;
        let (reserve0, reserve1, _) = reserves;
        let (sqrt_price_x96, tick, ..) = slot0;

        let snapshot = PoolSnapshot::new(
            ConstantProductPool {
                reserve0: U256::from(reserve0),
                reserve1: U256::from(reserve1),
                token0: pair_token0,
                token1: pair_token1,
            },
            ConcentratedPool {
                sqrt_price_x96,
                token0: pool_token0,
                token1: pool_token1,
                fee_tier: fee,
            },
        );
        validate(&snapshot)?;

        info!(
            reserve0 = %snapshot.constant_product.reserve0,
            reserve1 = %snapshot.constant_product.reserve1,
            sqrt_price_x96 = %sqrt_price_x96,
            tick,
            fee_tier = fee,
            "[POOL] snapshot fetched"
        );
        Ok(snapshot)
    }
}

/// Both pools must quote the same pair and hold a usable state.
pub fn validate(snapshot: &PoolSnapshot) -> Result<()> {
    let cp = &snapshot.constant_product;
    let cl = &snapshot.concentrated;
    if cp.reserve0.is_zero() || cp.reserve1.is_zero() {
        return Err(AppError::InvalidReserves {
            reserve_in: cp.reserve0,
            reserve_out: cp.reserve1,
        });
    }
    if cl.sqrt_price_x96.is_zero() {
        return Err(AppError::InvalidPoolState(
            "concentrated pool is not initialized".to_string(),
        ));
    }
    if !(cl.contains(cp.token0) && cl.contains(cp.token1)) {
        return Err(AppError::InvalidPoolState(format!(
            "pools trade different pairs: ({:?}, {:?}) vs ({:?}, {:?})",
            cp.token0, cp.token1, cl.token0, cl.token1
        )));
    }
    Ok(())
}
