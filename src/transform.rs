//! Mapping of raw API proposals into display records

use crate::model::{DisplayFlight, FareTerm, RawProposal};
use crate::StopoverError;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Currency assumed when a proposal carries no fare term
const DEFAULT_CURRENCY: &str = "USD";

/// Fares above this sort value are assumed to include a checked bag
const CHECKED_BAG_PRICE_THRESHOLD: f64 = 100.0;

const UNKNOWN_AIRLINE: &str = "Unknown Airline";
const UNKNOWN_AIRPORT: &str = "N/A";
const UNKNOWN_TIME: &str = "00:00";

/// Transform the `proposals` array of a search response.
///
/// Produces exactly one record per input, in input order. Records that fail
/// to deserialize or transform are replaced with a zero-price placeholder.
pub fn transform_proposals(proposals: &[Value]) -> Vec<DisplayFlight> {
    let flights: Vec<DisplayFlight> = proposals
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let result = serde_json::from_value::<RawProposal>(value.clone())
                .map_err(|e| StopoverError::ParseError(e.to_string()))
                .and_then(|proposal| transform_proposal(index, &proposal));

            result.unwrap_or_else(|e| {
                error!(index, error = %e, "Error transforming proposal");
                placeholder_flight(index)
            })
        })
        .collect();

    debug!(flights = flights.len(), "Transformed proposals");
    flights
}

/// Transform one proposal at `index` in the response.
pub fn transform_proposal(index: usize, proposal: &RawProposal) -> Result<DisplayFlight, StopoverError> {
    let legs = match proposal.segment.first() {
        Some(segment) if !segment.flight.is_empty() => &segment.flight,
        _ => {
            warn!(index, "Proposal has no flight legs, using placeholder");
            return Ok(placeholder_flight(index));
        }
    };

    // Non-empty checked above
    let first = &legs[0];
    let last = &legs[legs.len() - 1];

    let duration_minutes = legs
        .iter()
        .try_fold(0i64, |total, leg| total.checked_add(leg.duration.unwrap_or(0)))
        .ok_or_else(|| StopoverError::ParseError("Leg durations overflow".to_string()))?;
    let stop_count = legs.len().saturating_sub(1);

    let term = first_fare_term(proposal)?;
    let original_price = term.as_ref().and_then(|t| t.price).unwrap_or(0.0);
    let currency = term
        .as_ref()
        .and_then(|t| t.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    // unified_price is comparable across currencies; plain price is not
    let sort_value = term
        .as_ref()
        .and_then(|t| t.unified_price)
        .unwrap_or(original_price);

    Ok(DisplayFlight {
        id: index + 1,
        airline: airline_name(first.marketing_carrier.as_deref()),
        departure_time: first
            .departure_time
            .clone()
            .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
        arrival_time: last
            .arrival_time
            .clone()
            .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
        duration: format_duration(duration_minutes),
        duration_minutes,
        departure_airport: first
            .departure
            .clone()
            .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string()),
        arrival_airport: last
            .arrival
            .clone()
            .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string()),
        price: format_currency(original_price, &currency),
        price_sort_value: sort_value.round() as i64,
        original_price_value: original_price.round() as i64,
        currency,
        stops: stops_label(stop_count),
        stop_count,
        checked_bag: sort_value > CHECKED_BAG_PRICE_THRESHOLD,
        hand_baggage: true,
        rating: 3.5,
    })
}

/// First fare term in the order the API sent them. This is not necessarily
/// the cheapest term.
fn first_fare_term(proposal: &RawProposal) -> Result<Option<FareTerm>, StopoverError> {
    let terms = proposal
        .terms
        .as_ref()
        .ok_or_else(|| StopoverError::ParseError("Proposal has no terms".to_string()))?;
    match terms.values().next() {
        Some(value) => serde_json::from_value::<FareTerm>(value.clone())
            .map(Some)
            .map_err(|e| StopoverError::ParseError(format!("Invalid fare term: {}", e))),
        None => Ok(None),
    }
}

/// Record shown in place of a proposal that could not be read
pub fn placeholder_flight(index: usize) -> DisplayFlight {
    DisplayFlight {
        id: index + 1,
        airline: UNKNOWN_AIRLINE.to_string(),
        departure_time: UNKNOWN_TIME.to_string(),
        arrival_time: UNKNOWN_TIME.to_string(),
        duration: format_duration(0),
        duration_minutes: 0,
        departure_airport: UNKNOWN_AIRPORT.to_string(),
        arrival_airport: UNKNOWN_AIRPORT.to_string(),
        price: "$0".to_string(),
        price_sort_value: 0,
        original_price_value: 0,
        currency: DEFAULT_CURRENCY.to_string(),
        stops: "N/A".to_string(),
        stop_count: 0,
        checked_bag: false,
        hand_baggage: true,
        rating: 3.0,
    }
}

/// Display name for a marketing carrier code
pub fn airline_name(carrier_code: Option<&str>) -> String {
    let code = match carrier_code {
        Some(code) if !code.is_empty() => code,
        _ => return UNKNOWN_AIRLINE.to_string(),
    };

    let name = match code {
        "IX" => "Air India Express",
        "AI" => "Air India",
        "UK" => "Vistara",
        "6E" => "IndiGo",
        "SG" => "SpiceJet",
        "G8" => "GoAir",
        "I5" => "AirAsia India",
        "QP" => "Akasa Air",
        _ => return format!("{} Airlines", code),
    };
    name.to_string()
}

/// `185` -> `"3h 5m"`
pub fn format_duration(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn stops_label(stop_count: usize) -> String {
    match stop_count {
        0 => "Nonstop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    }
}

/// Format a rounded amount in its own currency, en-US style.
///
/// Currencies without a known symbol render as `"<CODE> <amount>"`.
pub fn format_currency(value: f64, currency: &str) -> String {
    let rounded = value.round() as i64;
    let amount = group_thousands(rounded.unsigned_abs());
    let sign = if rounded < 0 { "-" } else { "" };

    match currency_symbol(&currency.to_uppercase()) {
        Some(symbol) => format!("{}{}{}", sign, symbol, amount),
        None => format!("{} {}{}", currency, sign, amount),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "INR" => "₹",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "KRW" => "₩",
        "CAD" => "CA$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "HKD" => "HK$",
        "MXN" => "MX$",
        "BRL" => "R$",
        "ILS" => "₪",
        "VND" => "₫",
        "PHP" => "₱",
        "TWD" => "NT$",
        _ => return None,
    };
    Some(symbol)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_leg_proposal() -> Value {
        json!({
            "terms": {
                "fare-1": {"currency": "USD", "price": 250, "unified_price": 250}
            },
            "segment": [{
                "flight": [
                    {"marketing_carrier": "6E", "departure": "YYZ", "departure_time": "08:10",
                     "arrival": "ORD", "arrival_time": "09:30", "duration": 80},
                    {"marketing_carrier": "6E", "departure": "ORD", "departure_time": "10:45",
                     "arrival": "SEA", "arrival_time": "12:30", "duration": 105}
                ]
            }]
        })
    }

    #[test]
    fn test_two_leg_proposal() {
        let flights = transform_proposals(&[two_leg_proposal()]);
        assert_eq!(flights.len(), 1);

        let flight = &flights[0];
        assert_eq!(flight.id, 1);
        assert_eq!(flight.airline, "IndiGo");
        assert_eq!(flight.duration, "3h 5m");
        assert_eq!(flight.duration_minutes, 185);
        assert_eq!(flight.stops, "1 stop");
        assert_eq!(flight.stop_count, 1);
        assert_eq!(flight.price, "$250");
        assert_eq!(flight.departure_airport, "YYZ");
        assert_eq!(flight.arrival_airport, "SEA");
        assert_eq!(flight.departure_time, "08:10");
        assert_eq!(flight.arrival_time, "12:30");
        assert!(flight.checked_bag);
        assert!(flight.hand_baggage);
    }

    #[test]
    fn test_empty_segment_list_yields_placeholder() {
        let flights = transform_proposals(&[json!({"terms": {}, "segment": []})]);
        assert_eq!(flights[0], placeholder_flight(0));
        assert_eq!(flights[0].price_sort_value, 0);
        assert_eq!(flights[0].stop_count, 0);
        assert_eq!(flights[0].airline, "Unknown Airline");
    }

    #[test]
    fn test_segment_without_legs_yields_placeholder() {
        let flights = transform_proposals(&[json!({"segment": [{"flight": []}]})]);
        assert_eq!(flights[0].departure_airport, "N/A");
        assert_eq!(flights[0].price, "$0");
    }

    #[test]
    fn test_malformed_records_do_not_abort_batch() {
        let proposals = vec![
            json!(42),
            two_leg_proposal(),
            json!({"segment": "not-a-list"}),
            json!({"terms": {"a": {"price": "free"}}, "segment": [{"flight": [{"duration": 60}]}]}),
        ];
        let flights = transform_proposals(&proposals);

        assert_eq!(flights.len(), 4);
        let ids: Vec<usize> = flights.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(flights[0].airline, "Unknown Airline");
        assert_eq!(flights[1].airline, "IndiGo");
        assert_eq!(flights[2].price_sort_value, 0);
        assert_eq!(flights[3].price_sort_value, 0);
    }

    #[test]
    fn test_duration_overflow_yields_placeholder() {
        let proposals = vec![
            json!({"segment": [{"flight": [{"duration": i64::MAX}, {"duration": 1}]}]}),
            json!({"terms": {"a": {"currency": "USD", "price": 90}}, "segment": [{"flight": [{"duration": 60}]}]}),
        ];
        let flights = transform_proposals(&proposals);

        assert_eq!(flights.len(), 2);
        assert_eq!(flights[0], placeholder_flight(0));
        assert_eq!(flights[1].duration, "1h 0m");
        assert_eq!(flights[1].price, "$90");
    }

    #[test]
    fn test_missing_terms_yields_placeholder() {
        let proposals = vec![
            json!({"segment": [{"flight": [{"marketing_carrier": "6E", "duration": 60}]}]}),
            json!({"terms": {}, "segment": [{"flight": [{"marketing_carrier": "6E", "duration": 60}]}]}),
        ];
        let flights = transform_proposals(&proposals);

        assert_eq!(flights[0], placeholder_flight(0));
        assert_eq!(flights[0].rating, 3.0);
        assert_eq!(flights[1].airline, "IndiGo");
        assert_eq!(flights[1].price, "$0");
        assert_eq!(flights[1].currency, "USD");
        assert_eq!(flights[1].rating, 3.5);
    }

    #[test]
    fn test_stop_count_per_leg_count() {
        for legs in 1..5usize {
            let flight: Vec<Value> = (0..legs).map(|_| json!({"duration": 30})).collect();
            let proposal = json!({"terms": {}, "segment": [{"flight": flight}]});
            let flights = transform_proposals(&[proposal]);
            assert_eq!(flights[0].stop_count, legs - 1);
        }
    }

    #[test]
    fn test_unified_price_drives_sort_value() {
        let proposal = json!({
            "terms": {"x": {"currency": "INR", "price": 20755, "unified_price": 249.6}},
            "segment": [{"flight": [{"marketing_carrier": "AI", "duration": 125}]}]
        });
        let flight = &transform_proposals(&[proposal])[0];
        assert_eq!(flight.price, "₹20,755");
        assert_eq!(flight.price_sort_value, 250);
        assert_eq!(flight.original_price_value, 20755);
        assert_eq!(flight.currency, "INR");
    }

    #[test]
    fn test_sort_value_falls_back_to_price() {
        let proposal = json!({
            "terms": {"x": {"currency": "EUR", "price": 80.4}},
            "segment": [{"flight": [{"duration": 60}]}]
        });
        let flight = &transform_proposals(&[proposal])[0];
        assert_eq!(flight.price_sort_value, 80);
        assert!(!flight.checked_bag);
        assert_eq!(flight.price, "€80");
    }

    #[test]
    fn test_first_fare_term_is_used() {
        let proposal = json!({
            "terms": {
                "zz": {"currency": "USD", "price": 300},
                "aa": {"currency": "USD", "price": 120}
            },
            "segment": [{"flight": [{"duration": 60}]}]
        });
        let flight = &transform_proposals(&[proposal])[0];
        assert_eq!(flight.price, "$300");
    }

    #[test]
    fn test_airline_names() {
        assert_eq!(airline_name(Some("UK")), "Vistara");
        assert_eq!(airline_name(Some("QP")), "Akasa Air");
        assert_eq!(airline_name(Some("ZZ")), "ZZ Airlines");
        assert_eq!(airline_name(Some("")), "Unknown Airline");
        assert_eq!(airline_name(None), "Unknown Airline");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(250.0, "USD"), "$250");
        assert_eq!(format_currency(1234.5, "usd"), "$1,235");
        assert_eq!(format_currency(1_200_000.0, "EUR"), "€1,200,000");
        assert_eq!(format_currency(999.0, "CHF"), "CHF 999");
        assert_eq!(format_currency(12345.0, "XYZ"), "XYZ 12,345");
    }

    #[test]
    fn test_format_duration_and_stops() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(60), "1h 0m");
        assert_eq!(format_duration(185), "3h 5m");
        assert_eq!(stops_label(0), "Nonstop");
        assert_eq!(stops_label(1), "1 stop");
        assert_eq!(stops_label(3), "3 stops");
    }
}
