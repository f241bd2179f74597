//! Core library for the arbitrage-sizer project.
//!
//! Finds the trade size that maximizes round-trip profit between a constant-product
//! pair and a concentrated-liquidity pool quoting the same tokens.

pub mod aggregator;
pub mod arbitrage;
pub mod config;
pub mod dex;
pub mod errors;
pub mod models;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
