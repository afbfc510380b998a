//! Flattening of priced offers into output rows.

use chrono::NaiveDate;

use crate::data::{OfferView, PricedOffer};
use crate::domain::{FareQuery, FareRecord, PriceMetrics};

/// Build the output row for one priced offer.
///
/// Route identity and dates come from `query`, never from the offer, so every
/// row is consistent with the unit that produced it. Absent or null offer
/// fields become empty cells; a field present with the wrong shape is an error.
pub fn build_record(
    offer: &PricedOffer,
    query: &FareQuery,
    metrics: &PriceMetrics,
    acquired_on: NaiveDate,
) -> Result<FareRecord, serde_json::Error> {
    let view = OfferView::decode(&offer.0)?;

    let outbound = view.outbound();
    let inbound = view.inbound();
    let price = view.price.clone().unwrap_or_default();

    Ok(FareRecord {
        origin: query.origin.clone(),
        destination: query.destination.clone(),
        flight_date: query.departure_date,
        departure_time: outbound.and_then(|s| s.departure_time()),
        return_date: query.return_date,
        return_time: inbound.and_then(|s| s.departure_time()),
        acquisition_date: acquired_on,
        source: view.source.clone(),
        price: price.grand_total,
        net_price: price.base,
        currency: price.currency,
        carrier_outbound: outbound.and_then(|s| s.carrier_code.clone()),
        flight_outbound: outbound.and_then(|s| s.number.clone()),
        carrier_inbound: inbound.and_then(|s| s.carrier_code.clone()),
        flight_inbound: inbound.and_then(|s| s.number.clone()),
        metrics: metrics.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock::offer;
    use serde_json::json;

    fn query() -> FareQuery {
        FareQuery {
            origin: "AAA".to_string(),
            destination: "BBB".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 17).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2026, 11, 24).unwrap(),
            advance_days: 30,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn record_fields_map_from_offer() {
        let priced = PricedOffer(offer(3).0);
        let r = build_record(&priced, &query(), &PriceMetrics::new(), today()).unwrap();

        assert_eq!(r.origin, "AAA");
        assert_eq!(r.destination, "BBB");
        assert_eq!(r.flight_date, query().departure_date);
        assert_eq!(r.departure_time.as_deref(), Some("07:45:00"));
        assert_eq!(r.return_time.as_deref(), Some("19:05:00"));
        assert_eq!(r.acquisition_date, today());
        assert_eq!(r.source.as_deref(), Some("GDS"));
        assert_eq!(r.price.as_deref(), Some("103.00"));
        assert_eq!(r.net_price.as_deref(), Some("83.00"));
        assert_eq!(r.currency.as_deref(), Some("EUR"));
        assert_eq!(r.carrier_outbound.as_deref(), Some("IB"));
        assert_eq!(r.flight_outbound.as_deref(), Some("1003"));
        assert_eq!(r.flight_inbound.as_deref(), Some("2003"));
        assert!(r.metrics.is_empty());
    }

    #[test]
    fn missing_departure_is_null_not_error() {
        let priced = PricedOffer(json!({
            "itineraries": [{"segments": [{"carrierCode": "UX"}]}]
        }));
        let r = build_record(&priced, &query(), &PriceMetrics::new(), today()).unwrap();
        assert!(r.departure_time.is_none());
        assert!(r.return_time.is_none());
        assert_eq!(r.carrier_outbound.as_deref(), Some("UX"));
        assert!(r.price.is_none());
    }

    #[test]
    fn wrongly_shaped_field_is_an_error() {
        let priced = PricedOffer(json!({
            "price": {"grandTotal": "99.00", "currency": "EUR"},
            "itineraries": [{"segments": [{"departure": "garbled", "carrierCode": "IB", "number": "1"}]}]
        }));
        assert!(build_record(&priced, &query(), &PriceMetrics::new(), today()).is_err());

        let priced = PricedOffer(json!({"itineraries": "garbled", "price": 12}));
        assert!(build_record(&priced, &query(), &PriceMetrics::new(), today()).is_err());
    }

    #[test]
    fn null_fields_are_empty_cells() {
        let priced = PricedOffer(json!({
            "price": null,
            "itineraries": [{"segments": [{"departure": null, "carrierCode": "IB"}]}]
        }));
        let r = build_record(&priced, &query(), &PriceMetrics::new(), today()).unwrap();
        assert!(r.price.is_none());
        assert!(r.departure_time.is_none());
        assert_eq!(r.carrier_outbound.as_deref(), Some("IB"));
    }

    #[test]
    fn metrics_are_copied_onto_each_record() {
        let mut metrics = PriceMetrics::new();
        metrics.insert("MEDIUM", Some("95.00".to_string()));
        let r = build_record(&PricedOffer(offer(0).0), &query(), &metrics, today()).unwrap();
        assert_eq!(r.metrics.get("MEDIUM"), Some("95.00"));
    }
}
