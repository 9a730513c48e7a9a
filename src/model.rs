//! Core data types shared by the query builder, transform and results view

use crate::StopoverError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used on the wire and in results-view URLs
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Airport candidate returned by the autocomplete endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportOption {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl AirportOption {
    /// Label shown in the input once the option is selected
    pub fn label(&self) -> String {
        match &self.city {
            Some(city) => format!("{} - {} ({})", city, self.name, self.code),
            None => format!("{} ({})", self.name, self.code),
        }
    }
}

/// Trip type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
    MultiCity,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
            TripType::MultiCity => "multi-city",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = StopoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round-trip" | "roundtrip" => Ok(TripType::RoundTrip),
            "one-way" | "oneway" => Ok(TripType::OneWay),
            "multi-city" | "multicity" => Ok(TripType::MultiCity),
            _ => Err(StopoverError::ParseError(format!("Invalid trip type: {}", s))),
        }
    }
}

/// A complete, validated trip query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    origin_code: String,
    destination_code: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    passenger_count: u32,
    trip_type: TripType,
}

impl SearchQuery {
    /// Build a query, enforcing the trip-type/return-date invariant.
    ///
    /// A return date is required (and must not precede departure) for
    /// round trips. For any other trip type it is dropped.
    pub fn new(
        origin_code: impl Into<String>,
        destination_code: impl Into<String>,
        departure_date: NaiveDate,
        return_date: Option<NaiveDate>,
        passenger_count: u32,
        trip_type: TripType,
    ) -> Result<Self, StopoverError> {
        let origin_code = origin_code.into();
        let destination_code = destination_code.into();

        if origin_code.trim().is_empty() {
            return Err(StopoverError::InvalidQuery("origin is required".to_string()));
        }
        if destination_code.trim().is_empty() {
            return Err(StopoverError::InvalidQuery(
                "destination is required".to_string(),
            ));
        }
        if passenger_count < 1 {
            return Err(StopoverError::InvalidQuery(
                "at least one passenger is required".to_string(),
            ));
        }

        let return_date = match trip_type {
            TripType::RoundTrip => {
                let date = return_date.ok_or_else(|| {
                    StopoverError::InvalidQuery("round trips require a return date".to_string())
                })?;
                if date < departure_date {
                    return Err(StopoverError::InvalidQuery(format!(
                        "return date {} is before departure date {}",
                        date, departure_date
                    )));
                }
                Some(date)
            }
            TripType::OneWay | TripType::MultiCity => None,
        };

        Ok(Self {
            origin_code,
            destination_code,
            departure_date,
            return_date,
            passenger_count,
            trip_type,
        })
    }

    pub fn origin_code(&self) -> &str {
        &self.origin_code
    }

    pub fn destination_code(&self) -> &str {
        &self.destination_code
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    pub fn trip_type(&self) -> TripType {
        self.trip_type
    }

    /// URL parameters in the order the results view expects them
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("origin", self.origin_code.clone()),
            ("destination", self.destination_code.clone()),
            ("departure", self.departure_date.format(DATE_FORMAT).to_string()),
            ("adults", self.passenger_count.to_string()),
            ("tripType", self.trip_type.to_string()),
        ];
        if let Some(date) = self.return_date {
            params.push(("return", date.format(DATE_FORMAT).to_string()));
        }
        params
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, StopoverError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| StopoverError::DateParseError(s.to_string()))
}

/// One fare offer as returned by the search API.
///
/// Every field is optional: the payload is untrusted and partially missing
/// records are expected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProposal {
    /// Fare terms keyed by fare id, in the order the API sent them. A
    /// proposal without the key is unreadable; an empty map is a zero fare.
    #[serde(default)]
    pub terms: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub segment: Vec<RawSegment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSegment {
    #[serde(default)]
    pub flight: Vec<RawLeg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLeg {
    pub aircraft: Option<String>,
    pub arrival: Option<String>,
    pub arrival_date: Option<String>,
    pub arrival_time: Option<String>,
    pub departure: Option<String>,
    pub departure_date: Option<String>,
    pub departure_time: Option<String>,
    pub duration: Option<i64>,
    pub marketing_carrier: Option<String>,
    pub number: Option<String>,
    pub operating_carrier: Option<String>,
}

/// Price of one fare term
#[derive(Debug, Clone, Deserialize)]
pub struct FareTerm {
    pub currency: Option<String>,
    pub price: Option<f64>,
    pub unified_price: Option<f64>,
}

/// Display-ready flight record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFlight {
    /// 1-based position in the API response
    pub id: usize,
    pub airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub duration_minutes: i64,
    pub departure_airport: String,
    pub arrival_airport: String,
    /// Price formatted in its original currency
    pub price: String,
    /// Rounded value used for sorting; currency-normalized when the API provides it
    pub price_sort_value: i64,
    pub original_price_value: i64,
    pub currency: String,
    pub stops: String,
    pub stop_count: usize,
    pub checked_bag: bool,
    pub hand_baggage: bool,
    pub rating: f32,
}

/// User-selected result filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub checked_bag: bool,
    pub hand_baggage: bool,
    /// Selected airlines in the order they were picked
    pub airlines: Vec<String>,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        self.checked_bag || self.hand_baggage || !self.airlines.is_empty()
    }

    /// Number of filters currently applied
    pub fn active_count(&self) -> usize {
        usize::from(self.checked_bag) + usize::from(self.hand_baggage) + self.airlines.len()
    }

    pub fn is_airline_selected(&self, airline: &str) -> bool {
        self.airlines.iter().any(|a| a == airline)
    }

    pub fn toggle_airline(&mut self, airline: &str) {
        match self.airlines.iter().position(|a| a == airline) {
            Some(pos) => {
                self.airlines.remove(pos);
            }
            None => self.airlines.push(airline.to_string()),
        }
    }

    pub fn clear(&mut self) {
        *self = FilterState::default();
    }
}

/// Sort strategy for the results list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Best,
    Cheapest,
    Fastest,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Best => "best",
            SortOption::Cheapest => "cheapest",
            SortOption::Fastest => "fastest",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = StopoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "best" => Ok(SortOption::Best),
            "cheapest" => Ok(SortOption::Cheapest),
            "fastest" => Ok(SortOption::Fastest),
            _ => Err(StopoverError::ParseError(format!("Invalid sort option: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_trip_type_parsing() {
        assert!(matches!("round-trip".parse::<TripType>(), Ok(TripType::RoundTrip)));
        assert!(matches!("OneWay".parse::<TripType>(), Ok(TripType::OneWay)));
        assert!(matches!("multi-city".parse::<TripType>(), Ok(TripType::MultiCity)));
        assert!("invalid".parse::<TripType>().is_err());
        assert_eq!(TripType::RoundTrip.to_string(), "round-trip");
    }

    #[test]
    fn test_sort_option_parsing() {
        assert_eq!("cheapest".parse::<SortOption>().unwrap(), SortOption::Cheapest);
        assert_eq!("FASTEST".parse::<SortOption>().unwrap(), SortOption::Fastest);
        assert!("slowest".parse::<SortOption>().is_err());
        assert_eq!(SortOption::default(), SortOption::Best);
    }

    #[test]
    fn test_round_trip_requires_return_date() {
        let result = SearchQuery::new("YYZ", "SEA", date("2024-03-01"), None, 1, TripType::RoundTrip);
        assert!(matches!(result, Err(StopoverError::InvalidQuery(_))));

        let result = SearchQuery::new(
            "YYZ",
            "SEA",
            date("2024-03-05"),
            Some(date("2024-03-01")),
            1,
            TripType::RoundTrip,
        );
        assert!(result.is_err());

        let query = SearchQuery::new(
            "YYZ",
            "SEA",
            date("2024-03-01"),
            Some(date("2024-03-01")),
            2,
            TripType::RoundTrip,
        )
        .unwrap();
        assert_eq!(query.return_date(), Some(date("2024-03-01")));
    }

    #[test]
    fn test_one_way_drops_return_date() {
        let query = SearchQuery::new(
            "YYZ",
            "SEA",
            date("2024-03-01"),
            Some(date("2024-03-08")),
            1,
            TripType::OneWay,
        )
        .unwrap();
        assert_eq!(query.return_date(), None);
        assert!(query.to_params().iter().all(|(k, _)| *k != "return"));
    }

    #[test]
    fn test_zero_passengers_rejected() {
        let result = SearchQuery::new("YYZ", "SEA", date("2024-03-01"), None, 0, TripType::OneWay);
        assert!(result.is_err());
    }

    #[test]
    fn test_query_params() {
        let query = SearchQuery::new(
            "YYZ",
            "SEA",
            date("2024-03-01"),
            Some(date("2024-03-10")),
            3,
            TripType::RoundTrip,
        )
        .unwrap();
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("origin", "YYZ".to_string()),
                ("destination", "SEA".to_string()),
                ("departure", "2024-03-01".to_string()),
                ("adults", "3".to_string()),
                ("tripType", "round-trip".to_string()),
                ("return", "2024-03-10".to_string()),
            ]
        );
    }

    #[test]
    fn test_airport_label() {
        let mut airport = AirportOption {
            code: "SEA".to_string(),
            name: "Seattle-Tacoma International".to_string(),
            city: Some("Seattle".to_string()),
            country: Some("United States".to_string()),
        };
        assert_eq!(airport.label(), "Seattle - Seattle-Tacoma International (SEA)");
        airport.city = None;
        assert_eq!(airport.label(), "Seattle-Tacoma International (SEA)");
    }

    #[test]
    fn test_filter_state_counts() {
        let mut filters = FilterState::default();
        assert!(!filters.is_active());

        filters.checked_bag = true;
        filters.toggle_airline("IndiGo");
        filters.toggle_airline("Vistara");
        assert_eq!(filters.active_count(), 3);

        filters.toggle_airline("IndiGo");
        assert_eq!(filters.active_count(), 2);

        filters.toggle_airline("Air India");
        filters.toggle_airline("IndiGo");
        assert_eq!(filters.airlines, vec!["Vistara", "Air India", "IndiGo"]);
        assert!(filters.is_airline_selected("Air India"));

        filters.clear();
        assert_eq!(filters, FilterState::default());
    }
}
