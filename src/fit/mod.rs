//! Least-squares fitting orchestration.
//!
//! Responsibilities:
//!
//! - build the regularized normal system from labelled samples (`system`)
//! - evaluate solved parameters against the samples (`evaluate`)
//! - run all solvers and assemble the comparison report (`compare`)

pub mod compare;
pub mod evaluate;
pub mod system;

pub use compare::*;
pub use evaluate::*;
pub use system::*;
