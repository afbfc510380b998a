//! Shared domain types.
//!
//! These are the values that flow through the acquisition pipeline:
//!
//! - configured routes and the per-window queries resolved from them
//! - price-distribution metrics for a route/date
//! - flat fare records, one per priced offer

use std::time::Duration;

use chrono::{Days, NaiveDate};

/// Offers requested per search call unless overridden.
pub const DEFAULT_MAX_RESULTS: u32 = 20;
/// Upper bound the search endpoint accepts for `max`.
pub const PROVIDER_MAX_RESULTS: u32 = 250;
/// Offers per pricing call; larger requests are rejected by the provider.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Pause before each pricing call.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Column order of the output table, before any price-metric columns.
pub const FIXED_COLUMNS: [&str; 15] = [
    "origin",
    "destination",
    "flight_date",
    "departure_time",
    "return_date",
    "return_time",
    "acquisition_date",
    "source",
    "price",
    "net_price",
    "currency",
    "carrier_outbound",
    "flight_outbound",
    "carrier_inbound",
    "flight_inbound",
];

/// A configured origin/destination pair with its timing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub origin: String,
    pub destination: String,
    pub advance1: u32,
    pub advance2: u32,
    pub stay_days: u32,
}

impl Route {
    /// Both advance windows, in processing order.
    pub fn advance_windows(&self) -> [u32; 2] {
        [self.advance1, self.advance2]
    }

    /// Resolve the query for one advance window relative to `today`.
    ///
    /// Returns `None` only when the dates overflow the calendar.
    pub fn query_for(&self, today: NaiveDate, advance_days: u32) -> Option<FareQuery> {
        let departure_date = today.checked_add_days(Days::new(advance_days.into()))?;
        let return_date = departure_date.checked_add_days(Days::new(self.stay_days.into()))?;
        Some(FareQuery {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date,
            return_date,
            advance_days,
        })
    }
}

/// One (route, advance window) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub advance_days: u32,
}

impl FareQuery {
    /// Check the constraints every search request must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if !is_iata_code(&self.origin) {
            return Err(format!("origin '{}' is not a 3-letter airport code", self.origin));
        }
        if !is_iata_code(&self.destination) {
            return Err(format!(
                "destination '{}' is not a 3-letter airport code",
                self.destination
            ));
        }
        if self.departure_date >= self.return_date {
            return Err(format!(
                "departure {} is not before return {}",
                self.departure_date, self.return_date
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for FareQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} {}..{}",
            self.origin, self.destination, self.departure_date, self.return_date
        )
    }
}

pub fn is_iata_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Quartile label → amount, in the order the provider listed them.
///
/// Inserting an existing label replaces its amount but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceMetrics {
    entries: Vec<(String, Option<String>)>,
}

impl PriceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, amount: Option<String>) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = amount,
            None => self.entries.push((label, amount)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, amount)| amount.as_deref())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One output row, built from a single priced offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareRecord {
    pub origin: String,
    pub destination: String,
    pub flight_date: NaiveDate,
    pub departure_time: Option<String>,
    pub return_date: NaiveDate,
    pub return_time: Option<String>,
    pub acquisition_date: NaiveDate,
    pub source: Option<String>,
    pub price: Option<String>,
    pub net_price: Option<String>,
    pub currency: Option<String>,
    pub carrier_outbound: Option<String>,
    pub flight_outbound: Option<String>,
    pub carrier_inbound: Option<String>,
    pub flight_inbound: Option<String>,
    pub metrics: PriceMetrics,
}

impl FareRecord {
    /// Cells for `FIXED_COLUMNS`, nulls rendered as empty strings.
    pub fn fixed_cells(&self) -> [String; 15] {
        fn cell(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        [
            self.origin.clone(),
            self.destination.clone(),
            self.flight_date.to_string(),
            cell(&self.departure_time),
            self.return_date.to_string(),
            cell(&self.return_time),
            self.acquisition_date.to_string(),
            cell(&self.source),
            cell(&self.price),
            cell(&self.net_price),
            cell(&self.currency),
            cell(&self.carrier_outbound),
            cell(&self.flight_outbound),
            cell(&self.carrier_inbound),
            cell(&self.flight_inbound),
        ]
    }
}

/// Tuning knobs for the acquisition pipeline.
#[derive(Debug, Clone)]
pub struct AcquireSettings {
    pub max_results: u32,
    pub batch_size: usize,
    /// Rate-limit courtesy delay before every pricing call.
    pub batch_delay: Duration,
    pub currency: String,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}
