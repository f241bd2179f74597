pub mod evaluator;
pub mod search;
pub mod types;

pub use evaluator::{ProfitEvaluator, ProfitSource};
pub use search::{SearchAborted, SearchEngine};
pub use types::{ArbitrageConfig, SearchConfig, SearchStrategy};
