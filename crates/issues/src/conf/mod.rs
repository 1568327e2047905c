//! Conf module: read options model and TOML loading.

pub mod load;
pub mod model;

pub use model::{EmptyRulePolicy, ReadOptions};
