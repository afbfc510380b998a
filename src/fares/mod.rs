//! Fare acquisition stages: offer search, batched pricing, record reduction.

pub mod batch;
pub mod fetcher;
pub mod record;
pub mod reducer;

pub use batch::{BatchLedger, BatchState, DroppedBatch, Throttle};
pub use fetcher::{FetchError, fetch_offers};
pub use record::build_record;
pub use reducer::{MetricsStatus, ReduceError, Reduction, reduce};
