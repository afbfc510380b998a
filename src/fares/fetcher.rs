//! Offer search for a single (route, advance window) query.

use thiserror::Error;

use crate::data::{FareProvider, ProviderError, RawOffer};
use crate::domain::{FareQuery, PROVIDER_MAX_RESULTS};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("offer search failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Search raw (unpriced) offers for `query`.
///
/// The query is validated before anything is sent; the provider response is
/// capped at `max_results` offers.
pub fn fetch_offers(
    provider: &dyn FareProvider,
    query: &FareQuery,
    max_results: u32,
    currency: &str,
) -> Result<Vec<RawOffer>, FetchError> {
    query.validate().map_err(FetchError::InvalidQuery)?;
    if max_results == 0 || max_results > PROVIDER_MAX_RESULTS {
        return Err(FetchError::InvalidQuery(format!(
            "max_results must be within 1..={PROVIDER_MAX_RESULTS}, got {max_results}"
        )));
    }

    let mut offers = provider.search_offers(query, max_results, currency)?;
    offers.truncate(max_results as usize);

    tracing::debug!(%query, offers = offers.len(), "Fetched raw offers");
    Ok(offers)
}
