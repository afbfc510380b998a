//! Amadeus Self-Service API integration: offer search, pricing, price metrics.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::data::{FareProvider, PricedOffer, ProviderError, RawOffer};
use crate::domain::FareQuery;

const TEST_BASE_URL: &str = "https://test.api.amadeus.com";
const PRODUCTION_BASE_URL: &str = "https://api.amadeus.com";

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const SEARCH_PATH: &str = "/v2/shopping/flight-offers";
const PRICING_PATH: &str = "/v1/shopping/flight-offers/pricing";
const METRICS_PATH: &str = "/v1/analytics/itinerary-price-metrics";

/// Tokens are refreshed this long before the provider says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Which Amadeus environment to talk to. Test keys only work against `Test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmadeusHost {
    #[default]
    Test,
    Production,
}

impl AmadeusHost {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Test => TEST_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown Amadeus hostname '{other}' (expected test or production)")),
        }
    }
}

#[derive(Clone)]
pub struct AmadeusCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for AmadeusCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmadeusCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct AmadeusClient {
    client: Client,
    base_url: String,
    credentials: AmadeusCredentials,
    token: RefCell<Option<AccessToken>>,
}

impl AmadeusClient {
    pub fn new(
        credentials: AmadeusCredentials,
        host: AmadeusHost,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: host.base_url().to_string(),
            credentials,
            token: RefCell::new(None),
        })
    }

    /// Cached bearer token, refreshed through the client-credentials grant when stale.
    fn access_token(&self) -> Result<String, ProviderError> {
        if let Some(token) = self.token.borrow().as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let resp = self
            .client
            .post(format!("{}{TOKEN_PATH}", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.api_key.as_str()),
                ("client_secret", self.credentials.api_secret.as_str()),
            ])
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        let token = token_from_response(status, &body, Instant::now())?;
        let value = token.value.clone();
        *self.token.borrow_mut() = Some(token);
        Ok(value)
    }

    fn send_json(&self, request: RequestBuilder) -> Result<Value, ProviderError> {
        let token = self.access_token()?;
        let resp = request.bearer_auth(token).send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        json_from_response(status, &body)
    }
}

impl AccessToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Interpret the OAuth token endpoint's reply.
fn token_from_response(status: u16, body: &str, now: Instant) -> Result<AccessToken, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::Auth(format!("status {status}: {body}")));
    }
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Auth(format!("unreadable token response: {e}")))?;

    let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
    tracing::debug!(expires_in = parsed.expires_in, "Obtained provider access token");
    Ok(AccessToken {
        value: parsed.access_token,
        expires_at: now + lifetime,
    })
}

/// Non-2xx replies become `Status` errors carrying the body; others must be JSON.
fn json_from_response(status: u16, body: &str) -> Result<Value, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::Status {
            status,
            body: body.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(format!("response is not JSON: {e}")))
}

fn offers_from_search(body: Value) -> Result<Vec<RawOffer>, ProviderError> {
    let envelope: DataEnvelope<Vec<Value>> = serde_json::from_value(body)
        .map_err(|e| ProviderError::Decode(format!("flight-offers search: {e}")))?;
    Ok(envelope.data.into_iter().map(RawOffer).collect())
}

fn offers_from_pricing(body: Value) -> Result<Vec<PricedOffer>, ProviderError> {
    let envelope: DataEnvelope<PricingData> = serde_json::from_value(body)
        .map_err(|e| ProviderError::Decode(format!("flight-offers pricing: {e}")))?;
    Ok(envelope.data.flight_offers.into_iter().map(PricedOffer).collect())
}

impl FareProvider for AmadeusClient {
    fn search_offers(
        &self,
        query: &FareQuery,
        max_results: u32,
        currency: &str,
    ) -> Result<Vec<RawOffer>, ProviderError> {
        let params = search_params(query, max_results, currency);
        let request = self
            .client
            .get(format!("{}{SEARCH_PATH}", self.base_url))
            .query(&params);

        offers_from_search(self.send_json(request)?)
    }

    fn price_offers(&self, batch: &[RawOffer]) -> Result<Vec<PricedOffer>, ProviderError> {
        let request = self
            .client
            .post(format!("{}{PRICING_PATH}", self.base_url))
            .header("X-HTTP-Method-Override", "GET")
            .json(&pricing_request_body(batch));

        offers_from_pricing(self.send_json(request)?)
    }

    fn price_metrics(&self, query: &FareQuery, currency: &str) -> Result<Value, ProviderError> {
        let departure = query.departure_date.to_string();
        let request = self
            .client
            .get(format!("{}{METRICS_PATH}", self.base_url))
            .query(&[
                ("originIataCode", query.origin.as_str()),
                ("destinationIataCode", query.destination.as_str()),
                ("departureDate", departure.as_str()),
                ("currencyCode", currency),
            ]);

        self.send_json(request)
    }
}

/// Query string for a round-trip search: one adult, non-stop, economy.
fn search_params(query: &FareQuery, max_results: u32, currency: &str) -> Vec<(&'static str, String)> {
    vec![
        ("originLocationCode", query.origin.clone()),
        ("destinationLocationCode", query.destination.clone()),
        ("departureDate", query.departure_date.to_string()),
        ("returnDate", query.return_date.to_string()),
        ("adults", "1".to_string()),
        ("nonStop", "true".to_string()),
        ("travelClass", "ECONOMY".to_string()),
        ("currencyCode", currency.to_string()),
        ("max", max_results.to_string()),
    ]
}

fn pricing_request_body(batch: &[RawOffer]) -> Value {
    let offers: Vec<&Value> = batch.iter().map(|offer| &offer.0).collect();
    json!({
        "data": {
            "type": "flight-offers-pricing",
            "flightOffers": offers,
        }
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct PricingData {
    #[serde(rename = "flightOffers", default)]
    flight_offers: Vec<Value>,
}
