//! DEX integration: constant-product pricing, pool snapshots and the V3 quoter.

pub mod calc;
pub mod client;
pub mod quoter;
pub mod state;

pub use calc::{FeeRatio, quote_constant_product, spot_price_constant_product, spot_price_from_sqrt};
pub use client::PoolReader;
pub use quoter::{GatewayPolicy, GuardedQuoter, QuoteGateway, UniswapV3Quoter};
pub use state::{ConcentratedPool, ConstantProductPool, PoolSnapshot};
