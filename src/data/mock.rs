use std::cell::{Cell, RefCell};

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::data::{FareProvider, PricedOffer, ProviderError, RawOffer};
use crate::domain::FareQuery;

/// In-memory provider with scripted failures.
///
/// Pricing echoes each offer back unchanged. Pricing calls are numbered from
/// zero across the provider's lifetime.
pub struct ScriptedProvider {
    offers: Vec<RawOffer>,
    failing_searches: Vec<NaiveDate>,
    failing_pricing_calls: Vec<usize>,
    metrics: Option<Value>,
    pricing_call: Cell<usize>,
    pub searches: RefCell<Vec<FareQuery>>,
    pub priced_batch_sizes: RefCell<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(offers: Vec<RawOffer>) -> Self {
        Self {
            offers,
            failing_searches: Vec::new(),
            failing_pricing_calls: Vec::new(),
            metrics: Some(json!({"data": []})),
            pricing_call: Cell::new(0),
            searches: RefCell::new(Vec::new()),
            priced_batch_sizes: RefCell::new(Vec::new()),
        }
    }

    /// Fail searches whose departure date is `date`.
    pub fn fail_search_on(mut self, date: NaiveDate) -> Self {
        self.failing_searches.push(date);
        self
    }

    pub fn fail_pricing_call(mut self, call: usize) -> Self {
        self.failing_pricing_calls.push(call);
        self
    }

    pub fn with_metrics(mut self, body: Value) -> Self {
        self.metrics = Some(body);
        self
    }

    pub fn fail_metrics(mut self) -> Self {
        self.metrics = None;
        self
    }
}

fn scripted_failure(what: &str) -> ProviderError {
    ProviderError::Status {
        status: 500,
        body: format!("scripted {what} failure"),
    }
}

impl FareProvider for ScriptedProvider {
    fn search_offers(
        &self,
        query: &FareQuery,
        max_results: u32,
        _currency: &str,
    ) -> Result<Vec<RawOffer>, ProviderError> {
        self.searches.borrow_mut().push(query.clone());
        if self.failing_searches.contains(&query.departure_date) {
            return Err(scripted_failure("search"));
        }
        Ok(self.offers.iter().take(max_results as usize).cloned().collect())
    }

    fn price_offers(&self, batch: &[RawOffer]) -> Result<Vec<PricedOffer>, ProviderError> {
        let call = self.pricing_call.get();
        self.pricing_call.set(call + 1);
        self.priced_batch_sizes.borrow_mut().push(batch.len());
        if self.failing_pricing_calls.contains(&call) {
            return Err(scripted_failure("pricing"));
        }
        Ok(batch.iter().map(|offer| PricedOffer(offer.0.clone())).collect())
    }

    fn price_metrics(&self, _query: &FareQuery, _currency: &str) -> Result<Value, ProviderError> {
        self.metrics.clone().ok_or_else(|| scripted_failure("metrics"))
    }
}

/// A minimal round-trip offer with identifiable flight numbers.
pub fn offer(id: u32) -> RawOffer {
    RawOffer(json!({
        "id": id.to_string(),
        "source": "GDS",
        "price": {"grandTotal": format!("{}.00", 100 + id), "base": format!("{}.00", 80 + id), "currency": "EUR"},
        "itineraries": [
            {"segments": [{"departure": {"at": "2026-11-17T07:45:00"}, "carrierCode": "IB", "number": format!("{}", 1000 + id)}]},
            {"segments": [{"departure": {"at": "2026-11-24T19:05:00"}, "carrierCode": "IB", "number": format!("{}", 2000 + id)}]}
        ]
    }))
}

pub fn full_metrics() -> Value {
    json!({"data": [{"priceMetrics": [
        {"amount": "60.00", "quartileRanking": "MINIMUM"},
        {"amount": "80.00", "quartileRanking": "FIRST"},
        {"amount": "95.00", "quartileRanking": "MEDIUM"},
        {"amount": "120.00", "quartileRanking": "THIRD"},
        {"amount": "200.00", "quartileRanking": "MAXIMUM"}
    ]}]})
}
