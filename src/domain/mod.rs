//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - routes and resolved per-window queries (`Route`, `FareQuery`)
//! - output rows and price-distribution metrics (`FareRecord`, `PriceMetrics`)
//! - pipeline tuning (`AcquireSettings`)
//! - the run gate (`schedule`)

pub mod schedule;
pub mod types;

pub use types::*;
