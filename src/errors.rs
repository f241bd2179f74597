use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid reserves: reserve_in={reserve_in}, reserve_out={reserve_out}")]
    InvalidReserves {
        reserve_in: ethers::types::U256,
        reserve_out: ethers::types::U256,
    },

    #[error("Invalid pool state: {0}")]
    InvalidPoolState(String),

    #[error("Quote gateway timed out after {0:?}")]
    GatewayTimeout(Duration),

    #[error("Quote gateway error: {0}")]
    Gateway(String),

    #[error("Quote reverted: {0}")]
    QuoteReverted(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contract error: {0}")]
    Contract(
        #[from]
        ethers::contract::ContractError<ethers::providers::Provider<ethers::providers::Http>>,
    ),
}

impl AppError {
    /// Whether a retry at the gateway boundary could change the outcome. A revert is
    /// deterministic for a given snapshot and is never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::GatewayTimeout(_) | AppError::Gateway(_))
    }
}
