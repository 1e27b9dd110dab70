//! Mathematical utilities: dense linear solvers and diagonal-dominance checks.

pub mod dominance;
pub mod solvers;

pub use dominance::*;
pub use solvers::*;
