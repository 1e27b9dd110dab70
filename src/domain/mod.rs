//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - preprocessed observations (`Sample`) and the design they map to
//! - the regularized normal system (`NormalSystem`)
//! - per-method outcomes and the comparison report
//! - solver/validation configuration (`FitConfig`)

pub mod types;

pub use types::*;
