//! Input/output helpers.
//!
//! - route list ingest + validation (`routes`)
//! - output CSV artifact (`export`)

pub mod export;
pub mod routes;

pub use export::*;
pub use routes::*;
