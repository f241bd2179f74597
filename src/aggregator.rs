//! Direction choice and search orchestration over one pool snapshot.

use std::cmp::Ordering;
use std::time::Instant;

use ethers::types::Address;
use tracing::{debug, info, warn};

use crate::{
    arbitrage::{ArbitrageConfig, ProfitEvaluator, SearchAborted, SearchEngine},
    dex::{PoolSnapshot, QuoteGateway, spot_price_constant_product, spot_price_from_sqrt},
    errors::Result,
    models::{Direction, SearchReport},
};

/// Which pool to buy on, judged from spot prices of the non-quote token.
///
/// The cheaper pool is the buy side. `None` when both prices agree to eight places.
pub fn choose_direction(snapshot: &PoolSnapshot, quote_token: Address) -> Result<Option<Direction>> {
    let cp = &snapshot.constant_product;
    let cl = &snapshot.concentrated;
    let v2_price = spot_price_constant_product(cp.reserves(), cp.token0, quote_token)?;
    let v3_price = spot_price_from_sqrt(cl.sqrt_price_x96, cl.token0, quote_token)?;
    info!(v2_price = %v2_price, v3_price = %v3_price, "[SEARCH] spot prices");

    Ok(match v2_price.cmp(&v3_price) {
        Ordering::Less => Some(Direction::AToB),
        Ordering::Greater => Some(Direction::BToA),
        Ordering::Equal => None,
    })
}

/// Outcome of one leg of [`scan_both_directions`].
pub type DirectionScan = (Direction, std::result::Result<SearchReport, SearchAborted>);

/// Pick the direction from spot prices and search it.
pub async fn find_opportunity<Q: QuoteGateway + Sync>(
    snapshot: &PoolSnapshot,
    gateway: &Q,
    config: &ArbitrageConfig,
) -> std::result::Result<SearchReport, SearchAborted> {
    let started = Instant::now();
    let engine = SearchEngine::new(config.search.clone())?;

    let Some(direction) = choose_direction(snapshot, config.token_in)? else {
        warn!("[SEARCH] no opportunity for arbitrage: v2 and v3 spot prices are the same");
        return Ok(SearchReport::no_price_difference(
            config.search.min_amount_in,
            started.elapsed(),
        ));
    };
    info!("[SEARCH] arbitrage must be done from {direction}");

    search_direction(snapshot, gateway, config, &engine, direction).await
}

/// Search both directions concurrently, the spot-price favourite first.
///
/// The two runs share only the snapshot and the gateway; a failure in one does not stop
/// the other. Equal spot prices skip both runs.
pub async fn scan_both_directions<Q: QuoteGateway + Sync>(
    snapshot: &PoolSnapshot,
    gateway: &Q,
    config: &ArbitrageConfig,
) -> std::result::Result<Vec<DirectionScan>, SearchAborted> {
    let started = Instant::now();
    let engine = SearchEngine::new(config.search.clone())?;
    let Some(first) = choose_direction(snapshot, config.token_in)? else {
        warn!("[SEARCH] no opportunity for arbitrage: v2 and v3 spot prices are the same");
        let skipped =
            SearchReport::no_price_difference(config.search.min_amount_in, started.elapsed());
        return Ok(vec![
            (Direction::AToB, Ok(skipped.clone())),
            (Direction::BToA, Ok(skipped)),
        ]);
    };
    let second = first.opposite();

    let (a, b) = futures::join!(
        search_direction(snapshot, gateway, config, &engine, first),
        search_direction(snapshot, gateway, config, &engine, second),
    );
    Ok(vec![(first, a), (second, b)])
}

async fn search_direction<Q: QuoteGateway + Sync>(
    snapshot: &PoolSnapshot,
    gateway: &Q,
    config: &ArbitrageConfig,
    engine: &SearchEngine,
    direction: Direction,
) -> std::result::Result<SearchReport, SearchAborted> {
    let mut evaluator =
        ProfitEvaluator::new(snapshot, gateway, direction, config.token_in, config.v2_fee)?;
    if config.cache_evaluations {
        evaluator = evaluator.with_cache();
    }

    let outcome = engine.run(&mut evaluator).await?;
    debug!(%direction, quote_calls = evaluator.quote_calls(), "[QUOTER] remote quotes used");
    Ok(SearchReport::from_outcome(direction, outcome))
}
