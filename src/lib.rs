//! `latency-fit` library crate.
//!
//! Fits `latency ≈ θ0·size + θ1·density + θ2·cluster + θ3` from request logs by
//! solving ridge-regularized normal equations with three dense solvers (Gauss,
//! damped Jacobi, Gauss-Seidel) and cross-validating their results.
//!
//! The binary (`lfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the comparator can be embedded by other tools

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
