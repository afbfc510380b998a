//! Pricing & analytics reduction for one (route, advance window) unit.
//!
//! Raw offers are re-priced in batches, the price distribution for the route
//! and departure date is fetched, and every surviving offer becomes one
//! `FareRecord` carrying the distribution as extra columns.

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::{FareProvider, MetricsGap, ProviderError, RawOffer, decode_price_metrics};
use crate::domain::{AcquireSettings, FareQuery, FareRecord, PriceMetrics};
use crate::fares::batch::{DroppedBatch, Throttle, price_in_batches};
use crate::fares::record::build_record;

#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("price-metrics request failed: {0}")]
    Analytics(#[source] ProviderError),

    /// A priced offer carried a field of the wrong type; the unit yields nothing.
    #[error("priced offer has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Whether the unit's records carry quartile columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsStatus {
    /// Number of quartile labels attached to every record.
    Available(usize),
    Unavailable(MetricsGap),
}

#[derive(Debug)]
pub struct Reduction {
    pub records: Vec<FareRecord>,
    pub batches: usize,
    pub dropped: Vec<DroppedBatch>,
    pub metrics: MetricsStatus,
}

pub fn reduce(
    provider: &dyn FareProvider,
    raw_offers: &[RawOffer],
    query: &FareQuery,
    settings: &AcquireSettings,
    acquired_on: NaiveDate,
) -> Result<Reduction, ReduceError> {
    let throttle = Throttle::new(settings.batch_delay);
    let ledger = price_in_batches(provider, raw_offers, settings.batch_size, &throttle);

    let body = provider
        .price_metrics(query, &settings.currency)
        .map_err(ReduceError::Analytics)?;

    let (metrics, status) = match decode_price_metrics(&body) {
        Ok(metrics) => {
            let n = metrics.len();
            (metrics, MetricsStatus::Available(n))
        }
        Err(gap) => {
            tracing::info!(%query, reason = %gap, "No price metrics for this departure");
            (PriceMetrics::new(), MetricsStatus::Unavailable(gap))
        }
    };

    let records = ledger
        .priced
        .iter()
        .map(|offer| build_record(offer, query, &metrics, acquired_on))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ReduceError::Shape)?;

    Ok(Reduction {
        records,
        batches: ledger.batches,
        dropped: ledger.dropped,
        metrics: status,
    })
}
