//! Flight-search provider boundary.
//!
//! The pipeline only talks to the provider through [`FareProvider`], so the
//! Amadeus HTTP client and the scripted test provider are interchangeable.

use serde_json::Value;
use thiserror::Error;

use crate::domain::FareQuery;

pub mod amadeus;
#[cfg(test)]
pub mod mock;
pub mod payload;

pub use amadeus::{AmadeusClient, AmadeusCredentials, AmadeusHost};
pub use payload::{MetricsGap, OfferView, decode_price_metrics};

/// An offer exactly as the search endpoint returned it.
///
/// Kept opaque: the pricing endpoint expects the offers back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOffer(pub Value);

/// An offer confirmed by the pricing endpoint; source of truth for the price.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOffer(pub Value);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// The three provider endpoints the pipeline needs.
pub trait FareProvider {
    /// Search round-trip offers for `query`, at most `max_results` of them.
    fn search_offers(
        &self,
        query: &FareQuery,
        max_results: u32,
        currency: &str,
    ) -> Result<Vec<RawOffer>, ProviderError>;

    /// Re-price one batch of offers.
    fn price_offers(&self, batch: &[RawOffer]) -> Result<Vec<PricedOffer>, ProviderError>;

    /// Fetch the price-distribution analysis body for a route and departure date.
    ///
    /// The body is returned undecoded: a response that arrives but cannot be
    /// interpreted is a degraded outcome, not a request failure.
    fn price_metrics(&self, query: &FareQuery, currency: &str) -> Result<Value, ProviderError>;
}
