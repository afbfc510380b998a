//! Typed views over provider payloads.
//!
//! Offers arrive as deeply nested JSON where any level may be absent. Rather
//! than chasing optional lookups at every use site, an offer is decoded once
//! into [`OfferView`], whose fields are all optional. Scalars are accepted as
//! strings or numbers since the provider is not consistent about either.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::domain::PriceMetrics;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OfferView {
    #[serde(deserialize_with = "scalar")]
    pub source: Option<String>,
    pub price: Option<PriceView>,
    #[serde(deserialize_with = "list")]
    pub itineraries: Vec<ItineraryView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceView {
    #[serde(rename = "grandTotal", deserialize_with = "scalar")]
    pub grand_total: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub base: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItineraryView {
    #[serde(deserialize_with = "list")]
    pub segments: Vec<SegmentView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SegmentView {
    pub departure: Option<EndpointView>,
    #[serde(rename = "carrierCode", deserialize_with = "scalar")]
    pub carrier_code: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointView {
    #[serde(deserialize_with = "scalar")]
    pub at: Option<String>,
}

impl OfferView {
    pub fn decode(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// First segment of the first itinerary.
    pub fn outbound(&self) -> Option<&SegmentView> {
        self.itineraries.first()?.segments.first()
    }

    /// First segment of the last itinerary.
    pub fn inbound(&self) -> Option<&SegmentView> {
        self.itineraries.last()?.segments.first()
    }
}

impl SegmentView {
    pub fn departure_at(&self) -> Option<&str> {
        self.departure.as_ref()?.at.as_deref()
    }

    /// `HH:MM:SS` part of the departure timestamp.
    pub fn departure_time(&self) -> Option<String> {
        self.departure_at().map(|at| time_suffix(at).to_string())
    }
}

/// Last 8 characters of a timestamp (`2026-11-17T07:45:00` → `07:45:00`).
///
/// Strings shorter than 8 characters are returned whole.
pub fn time_suffix(timestamp: &str) -> &str {
    match timestamp.char_indices().rev().nth(7) {
        Some((idx, _)) => &timestamp[idx..],
        None => timestamp,
    }
}

/// Why an analytics response produced no metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsGap {
    #[error("analytics response has no rows")]
    NoRows,
    #[error("analytics response is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct MetricsBody {
    #[serde(default)]
    data: Vec<MetricsRow>,
}

#[derive(Debug, Deserialize)]
struct MetricsRow {
    #[serde(rename = "priceMetrics", default)]
    price_metrics: Vec<MetricLevel>,
}

#[derive(Debug, Deserialize)]
struct MetricLevel {
    #[serde(rename = "quartileRanking", default, deserialize_with = "scalar")]
    quartile_ranking: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    amount: Option<String>,
}

/// Decode the first row of an itinerary-price-metrics response.
pub fn decode_price_metrics(body: &Value) -> Result<PriceMetrics, MetricsGap> {
    let body = MetricsBody::deserialize(body).map_err(|e| MetricsGap::Malformed(e.to_string()))?;
    let row = body.data.into_iter().next().ok_or(MetricsGap::NoRows)?;

    let mut metrics = PriceMetrics::new();
    for level in row.price_metrics {
        if let Some(label) = level.quartile_ranking {
            metrics.insert(label, level.amount);
        }
    }

    if metrics.is_empty() {
        return Err(MetricsGap::NoRows);
    }
    Ok(metrics)
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn time_suffix_takes_last_eight_chars() {
        assert_eq!(time_suffix("2026-11-17T07:45:00"), "07:45:00");
        assert_eq!(time_suffix("T23:59:59"), "23:59:59");
        assert_eq!(time_suffix("07:45"), "07:45");
        assert_eq!(time_suffix(""), "");
    }

    #[test]
    fn legs_come_from_first_and_last_itinerary() {
        let offer = json!({
            "source": "GDS",
            "price": {"grandTotal": "210.40", "base": "150.00", "currency": "EUR"},
            "itineraries": [
                {"segments": [
                    {"departure": {"at": "2026-11-17T07:45:00"}, "carrierCode": "IB", "number": "3100"},
                    {"departure": {"at": "2026-11-17T11:00:00"}, "carrierCode": "IB", "number": "3200"}
                ]},
                {"segments": [
                    {"departure": {"at": "2026-11-24T19:05:00"}, "carrierCode": "VY", "number": 1234}
                ]}
            ]
        });

        let view = OfferView::decode(&offer).unwrap();
        let out = view.outbound().unwrap();
        let inb = view.inbound().unwrap();
        assert_eq!(out.carrier_code.as_deref(), Some("IB"));
        assert_eq!(out.number.as_deref(), Some("3100"));
        assert_eq!(out.departure_time().as_deref(), Some("07:45:00"));
        assert_eq!(inb.carrier_code.as_deref(), Some("VY"));
        assert_eq!(inb.number.as_deref(), Some("1234"));
        assert_eq!(inb.departure_time().as_deref(), Some("19:05:00"));
    }

    #[test]
    fn absent_fields_decode_to_none() {
        let view = OfferView::decode(&json!({"itineraries": [{"segments": [{}]}]})).unwrap();
        let seg = view.outbound().unwrap();
        assert!(seg.departure_time().is_none());
        assert!(seg.carrier_code.is_none());
        assert!(view.price.is_none());

        let bare = OfferView::decode(&json!({"itineraries": null, "price": null})).unwrap();
        assert!(bare.outbound().is_none());
        assert!(bare.inbound().is_none());
    }

    #[test]
    fn metrics_from_first_row_in_order() {
        let body = json!({"data": [{"priceMetrics": [
            {"amount": "32.75", "quartileRanking": "MINIMUM"},
            {"amount": "50.10", "quartileRanking": "FIRST"},
            {"amount": "72.00", "quartileRanking": "MEDIUM"},
            {"amount": 90, "quartileRanking": "THIRD"},
            {"amount": "120.00", "quartileRanking": "MAXIMUM"}
        ]}]});
        let metrics = decode_price_metrics(&body).unwrap();
        assert_eq!(
            metrics.labels().collect::<Vec<_>>(),
            vec!["MINIMUM", "FIRST", "MEDIUM", "THIRD", "MAXIMUM"]
        );
        assert_eq!(metrics.get("THIRD"), Some("90"));
    }

    #[test]
    fn empty_or_broken_metrics_are_gaps() {
        assert_eq!(decode_price_metrics(&json!({"data": []})), Err(MetricsGap::NoRows));
        assert_eq!(decode_price_metrics(&json!({})), Err(MetricsGap::NoRows));
        assert_eq!(
            decode_price_metrics(&json!({"data": [{"priceMetrics": []}]})),
            Err(MetricsGap::NoRows)
        );
        assert!(matches!(
            decode_price_metrics(&json!({"data": "nope"})),
            Err(MetricsGap::Malformed(_))
        ));
    }
}
