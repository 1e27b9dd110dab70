//! Latency model: design rows and predictions.
//!
//! Kept as small, pure functions so the builder and evaluator share one
//! definition of the feature layout.

pub mod model;

pub use model::*;
