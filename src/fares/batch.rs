//! Batched re-pricing with per-batch failure isolation.
//!
//! Each batch goes `PENDING → PRICED` (offers kept) or `PENDING → DROPPED`
//! (offers discarded). There are no retries and no partial-batch recovery.

use std::time::Duration;

use crate::data::{FareProvider, PricedOffer, ProviderError, RawOffer};

/// Fixed pause before every pricing call, keeping under the provider's rate limit.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

/// Terminal state of one batch.
#[derive(Debug)]
pub enum BatchState {
    Priced(Vec<PricedOffer>),
    Dropped(ProviderError),
}

#[derive(Debug)]
pub struct DroppedBatch {
    pub index: usize,
    pub size: usize,
    pub error: ProviderError,
}

/// Outcome of pricing every batch of one unit.
#[derive(Debug, Default)]
pub struct BatchLedger {
    /// Surviving offers, in batch order then within-batch order.
    pub priced: Vec<PricedOffer>,
    pub dropped: Vec<DroppedBatch>,
    pub batches: usize,
}

impl BatchLedger {
    fn settle(&mut self, index: usize, size: usize, state: BatchState) {
        self.batches += 1;
        match state {
            BatchState::Priced(offers) => self.priced.extend(offers),
            BatchState::Dropped(error) => self.dropped.push(DroppedBatch { index, size, error }),
        }
    }
}

/// Consecutive batches of `batch_size` (the last one may be smaller).
pub fn partition(offers: &[RawOffer], batch_size: usize) -> std::slice::Chunks<'_, RawOffer> {
    offers.chunks(batch_size.max(1))
}

/// Price `offers` batch by batch, dropping any batch whose call fails.
pub fn price_in_batches(
    provider: &dyn FareProvider,
    offers: &[RawOffer],
    batch_size: usize,
    throttle: &Throttle,
) -> BatchLedger {
    let mut ledger = BatchLedger::default();
    for (index, batch) in partition(offers, batch_size).enumerate() {
        throttle.pause();
        let state = price_batch(provider, index, batch);
        ledger.settle(index, batch.len(), state);
    }
    ledger
}

fn price_batch(provider: &dyn FareProvider, index: usize, batch: &[RawOffer]) -> BatchState {
    match provider.price_offers(batch) {
        Ok(priced) => {
            tracing::debug!(batch = index, size = batch.len(), priced = priced.len(), "Batch priced");
            BatchState::Priced(priced)
        }
        Err(error) => {
            tracing::warn!(batch = index, size = batch.len(), %error, "Dropping batch after pricing failure");
            BatchState::Dropped(error)
        }
    }
}
