//! Data sources that do not come from request logs.

pub mod sample;

pub use sample::{SampleData, SyntheticConfig, generate_sample};
