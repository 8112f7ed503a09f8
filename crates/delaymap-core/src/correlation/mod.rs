mod lag_search;
pub mod pearson;

pub use lag_search::{peak_lag, LagCorrelationMapper};
pub use pearson::pearson;
