//! Shared acquisition pipeline.
//!
//! For every route and each of its two advance windows:
//! offer search -> batched pricing -> price metrics -> records.
//!
//! Results are folded into an explicit [`Acquisition`] value. A unit that
//! fails anywhere contributes no records; the failure is kept in its
//! [`UnitReport`] and the run moves on.

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::{FareProvider, ProviderError};
use crate::domain::{AcquireSettings, FareQuery, FareRecord, Route};
use crate::fares::{FetchError, MetricsStatus, ReduceError, Reduction, fetch_offers, reduce};

/// Why a unit contributed nothing.
#[derive(Debug, Error)]
pub enum UnitFailure {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("offer search failed: {0}")]
    Search(ProviderError),

    #[error("price-metrics request failed: {0}")]
    Analytics(ProviderError),

    #[error("priced offer has an unexpected shape: {0}")]
    Shape(serde_json::Error),
}

impl From<FetchError> for UnitFailure {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidQuery(msg) => Self::InvalidQuery(msg),
            FetchError::Provider(e) => Self::Search(e),
        }
    }
}

impl From<ReduceError> for UnitFailure {
    fn from(err: ReduceError) -> Self {
        match err {
            ReduceError::Analytics(e) => Self::Analytics(e),
            ReduceError::Shape(e) => Self::Shape(e),
        }
    }
}

#[derive(Debug)]
pub enum UnitOutcome {
    Complete {
        records: usize,
        dropped_batches: usize,
        metrics: MetricsStatus,
    },
    Failed(UnitFailure),
}

#[derive(Debug)]
pub struct UnitReport {
    pub query: FareQuery,
    pub outcome: UnitOutcome,
}

/// Everything a run acquired, plus how each unit went.
#[derive(Debug, Default)]
pub struct Acquisition {
    pub records: Vec<FareRecord>,
    pub units: Vec<UnitReport>,
}

impl Acquisition {
    /// Fold one unit's result into the accumulator.
    pub fn absorb(mut self, query: FareQuery, result: Result<Reduction, UnitFailure>) -> Self {
        let outcome = match result {
            Ok(reduction) => {
                tracing::info!(
                    %query,
                    records = reduction.records.len(),
                    batches = reduction.batches,
                    dropped_batches = reduction.dropped.len(),
                    "Unit acquired"
                );
                let outcome = UnitOutcome::Complete {
                    records: reduction.records.len(),
                    dropped_batches: reduction.dropped.len(),
                    metrics: reduction.metrics,
                };
                self.records.extend(reduction.records);
                outcome
            }
            Err(failure) => {
                tracing::warn!(%query, error = %failure, "Unit contributed no fares");
                UnitOutcome::Failed(failure)
            }
        };
        self.units.push(UnitReport { query, outcome });
        self
    }

    pub fn failed_units(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Failed(_)))
            .count()
    }
}

/// Run one (route, advance window) unit end to end.
pub fn run_unit(
    provider: &dyn FareProvider,
    query: &FareQuery,
    settings: &AcquireSettings,
    acquired_on: NaiveDate,
) -> Result<Reduction, UnitFailure> {
    let offers = fetch_offers(provider, query, settings.max_results, &settings.currency)?;
    let reduction = reduce(provider, &offers, query, settings, acquired_on)?;
    Ok(reduction)
}

/// Acquire fares for every route and advance window, sequentially.
pub fn acquire(
    provider: &dyn FareProvider,
    routes: &[Route],
    settings: &AcquireSettings,
    today: NaiveDate,
) -> Acquisition {
    routes
        .iter()
        .flat_map(|route| {
            route
                .advance_windows()
                .into_iter()
                .map(move |advance| (route, advance))
        })
        .fold(Acquisition::default(), |acc, (route, advance)| {
            match route.query_for(today, advance) {
                Some(query) => {
                    let result = run_unit(provider, &query, settings, today);
                    acc.absorb(query, result)
                }
                None => {
                    tracing::warn!(
                        origin = %route.origin,
                        destination = %route.destination,
                        advance,
                        "Travel dates fall outside the calendar; skipping window"
                    );
                    acc
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawOffer;
    use crate::data::mock::{ScriptedProvider, full_metrics, offer};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn settings() -> AcquireSettings {
        AcquireSettings {
            batch_delay: Duration::ZERO,
            ..AcquireSettings::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn route(origin: &str, destination: &str, advance1: u32, advance2: u32) -> Route {
        Route {
            origin: origin.to_string(),
            destination: destination.to_string(),
            advance1,
            advance2,
            stay_days: 7,
        }
    }

    #[test]
    fn two_windows_give_two_flight_dates() {
        let provider = ScriptedProvider::new((0..3).map(offer).collect()).with_metrics(full_metrics());
        let routes = vec![route("AAA", "BBB", 30, 60)];

        let run = acquire(&provider, &routes, &settings(), today());

        assert_eq!(run.records.len(), 6);
        assert_eq!(run.units.len(), 2);
        let dates: BTreeSet<NaiveDate> = run.records.iter().map(|r| r.flight_date).collect();
        assert_eq!(dates.len(), 2);
        assert!(dates.contains(&NaiveDate::from_ymd_opt(2026, 11, 17).unwrap()));
        assert!(dates.contains(&NaiveDate::from_ymd_opt(2026, 12, 17).unwrap()));
        assert!(run.records.iter().all(|r| r.origin == "AAA" && r.destination == "BBB"));
    }

    #[test]
    fn failed_search_contributes_nothing_and_run_continues() {
        let first_departure = NaiveDate::from_ymd_opt(2026, 11, 17).unwrap();
        let provider = ScriptedProvider::new((0..2).map(offer).collect())
            .with_metrics(full_metrics())
            .fail_search_on(first_departure);
        let routes = vec![route("AAA", "BBB", 30, 60), route("CCC", "DDD", 30, 45)];

        let run = acquire(&provider, &routes, &settings(), today());

        // Both routes' first window depart on the failing date.
        assert_eq!(run.failed_units(), 2);
        assert_eq!(run.records.len(), 4);
        assert!(run.records.iter().all(|r| r.flight_date != first_departure));
        assert!(matches!(
            run.units[0].outcome,
            UnitOutcome::Failed(UnitFailure::Search(_))
        ));
        assert_eq!(provider.searches.borrow().len(), 4);
    }

    #[test]
    fn analytics_failure_empties_the_unit() {
        let provider = ScriptedProvider::new((0..4).map(offer).collect()).fail_metrics();
        let run = acquire(&provider, &[route("AAA", "BBB", 10, 20)], &settings(), today());

        assert!(run.records.is_empty());
        assert!(run.units.iter().all(|u| matches!(
            u.outcome,
            UnitOutcome::Failed(UnitFailure::Analytics(_))
        )));
    }

    #[test]
    fn wrongly_shaped_offer_fails_its_unit_without_rows() {
        let garbled = RawOffer(json!({
            "price": {"grandTotal": "99.00", "currency": "EUR"},
            "itineraries": [{"segments": [{"departure": "garbled", "carrierCode": "IB", "number": "1"}]}]
        }));
        let provider = ScriptedProvider::new(vec![offer(0), garbled]).with_metrics(full_metrics());

        let run = acquire(&provider, &[route("AAA", "BBB", 10, 20)], &settings(), today());

        assert!(run.records.is_empty());
        assert_eq!(run.failed_units(), 2);
        assert!(matches!(
            run.units[0].outcome,
            UnitOutcome::Failed(UnitFailure::Shape(_))
        ));
    }

    #[test]
    fn invalid_route_codes_are_reported_per_unit() {
        let provider = ScriptedProvider::new(vec![offer(0)]);
        let run = acquire(&provider, &[route("AA1", "BBB", 10, 20)], &settings(), today());

        assert!(run.records.is_empty());
        assert_eq!(run.failed_units(), 2);
        assert!(matches!(
            run.units[1].outcome,
            UnitOutcome::Failed(UnitFailure::InvalidQuery(_))
        ));
        assert!(provider.searches.borrow().is_empty());
    }

    #[test]
    fn records_match_the_unit_that_produced_them() {
        let provider = ScriptedProvider::new((0..7).map(offer).collect())
            .with_metrics(full_metrics())
            .fail_pricing_call(1);
        let routes = vec![route("AAA", "BBB", 30, 60)];

        let run = acquire(&provider, &routes, &settings(), today());

        // 7 offers per window: the second pricing call (window one, batch two) fails.
        assert_eq!(run.records.len(), 5 + 7);
        match &run.units[0].outcome {
            UnitOutcome::Complete {
                records,
                dropped_batches,
                metrics,
            } => {
                assert_eq!(*records, 5);
                assert_eq!(*dropped_batches, 1);
                assert_eq!(*metrics, MetricsStatus::Available(5));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        for unit in &run.units {
            let q = &unit.query;
            assert!(
                run.records
                    .iter()
                    .filter(|r| r.flight_date == q.departure_date)
                    .all(|r| r.return_date == q.return_date && r.origin == q.origin)
            );
        }
    }
}
