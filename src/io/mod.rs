//! Input/output helpers.
//!
//! - request-log ingest, label loading, experiment layout (`ingest`)
//! - metrics text + validation JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
