//! Landing-form query builder and results-view URL handling

use crate::model::{AirportOption, SearchQuery, TripType};
use crate::StopoverError;
use chrono::{Local, NaiveDate};
use reqwest::Url;
use tracing::debug;

/// Path of the results view
pub const RESULTS_PATH: &str = "/flights";

/// Collects a trip query field by field and validates it for completeness.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    trip_type: TripType,
    origin: Option<AirportOption>,
    destination: Option<AirportOption>,
    departure_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
    passengers: u32,
    today: NaiveDate,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    /// Builder whose "today" is fixed, for date selection rules
    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            trip_type: TripType::OneWay,
            origin: None,
            destination: None,
            departure_date: None,
            return_date: None,
            passengers: 1,
            today,
        }
    }

    pub fn trip_type(&self) -> TripType {
        self.trip_type
    }

    pub fn set_trip_type(&mut self, trip_type: TripType) {
        self.trip_type = trip_type;
    }

    pub fn origin(&self) -> Option<&AirportOption> {
        self.origin.as_ref()
    }

    pub fn set_origin(&mut self, airport: Option<AirportOption>) {
        self.origin = airport;
    }

    pub fn destination(&self) -> Option<&AirportOption> {
        self.destination.as_ref()
    }

    pub fn set_destination(&mut self, airport: Option<AirportOption>) {
        self.destination = airport;
    }

    pub fn passengers(&self) -> u32 {
        self.passengers
    }

    /// "traveler" / "travelers"
    pub fn passenger_label(&self) -> &'static str {
        if self.passengers == 1 {
            "traveler"
        } else {
            "travelers"
        }
    }

    /// Add `delta` passengers; the count never drops below one
    pub fn adjust_passengers(&mut self, delta: i32) {
        let next = i64::from(self.passengers) + i64::from(delta);
        self.passengers = next.clamp(1, i64::from(u32::MAX)) as u32;
    }

    pub fn departure_date(&self) -> Option<NaiveDate> {
        self.departure_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    /// Departure dates in the past are disabled
    pub fn is_departure_selectable(&self, date: NaiveDate) -> bool {
        date >= self.today
    }

    /// The return picker is only enabled for round trips
    pub fn return_enabled(&self) -> bool {
        self.trip_type == TripType::RoundTrip
    }

    /// Return dates before departure (or before today if no departure is
    /// picked yet) are disabled
    pub fn is_return_selectable(&self, date: NaiveDate) -> bool {
        self.return_enabled() && date >= self.departure_date.unwrap_or(self.today)
    }

    pub fn select_departure_date(&mut self, date: NaiveDate) -> Result<(), StopoverError> {
        if !self.is_departure_selectable(date) {
            return Err(StopoverError::InvalidQuery(format!(
                "departure date {} is in the past",
                date
            )));
        }
        self.departure_date = Some(date);
        if self.return_date.is_some_and(|ret| ret < date) {
            self.return_date = None;
        }
        Ok(())
    }

    pub fn select_return_date(&mut self, date: NaiveDate) -> Result<(), StopoverError> {
        if !self.return_enabled() {
            return Err(StopoverError::InvalidQuery(
                "return date is only used for round trips".to_string(),
            ));
        }
        if !self.is_return_selectable(date) {
            return Err(StopoverError::InvalidQuery(format!(
                "return date {} is before departure",
                date
            )));
        }
        self.return_date = Some(date);
        Ok(())
    }

    pub fn can_search(&self) -> bool {
        self.origin.is_some()
            && self.destination.is_some()
            && self.passengers > 0
            && self.departure_date.is_some()
            && (self.trip_type != TripType::RoundTrip || self.return_date.is_some())
    }

    pub fn build(&self) -> Result<SearchQuery, StopoverError> {
        let origin = self
            .origin
            .as_ref()
            .ok_or_else(|| StopoverError::InvalidQuery("origin is required".to_string()))?;
        let destination = self
            .destination
            .as_ref()
            .ok_or_else(|| StopoverError::InvalidQuery("destination is required".to_string()))?;
        let departure = self
            .departure_date
            .ok_or_else(|| StopoverError::InvalidQuery("departure date is required".to_string()))?;

        SearchQuery::new(
            origin.code.clone(),
            destination.code.clone(),
            departure,
            self.return_date,
            self.passengers,
            self.trip_type,
        )
    }

    /// Navigation target for the results view
    pub fn results_url(&self) -> Result<String, StopoverError> {
        let query = self.build()?;
        let url = results_url(&query);
        debug!(url = %url, "Built results URL");
        Ok(url)
    }
}

/// `/flights?origin=…&destination=…` for a query
pub fn results_url(query: &SearchQuery) -> String {
    let mut url = base_url();
    url.set_path(RESULTS_PATH);
    url.query_pairs_mut().extend_pairs(query.to_params());
    match url.query() {
        Some(q) => format!("{}?{}", RESULTS_PATH, q),
        None => RESULTS_PATH.to_string(),
    }
}

fn base_url() -> Url {
    // Static and always valid
    Url::parse("http://stopover.local/").expect("valid base url")
}

/// Decoded query parameters of a results-view URL.
///
/// Accepts an absolute URL, a path with a query string (`/flights?…`), a
/// bare query string with or without the leading `?`, or an empty string.
pub fn url_params(url: &str) -> Vec<(String, String)> {
    let trimmed = url.trim();
    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed).ok()
    } else if trimmed.starts_with('/') || trimmed.starts_with('?') {
        base_url().join(trimmed).ok()
    } else {
        base_url().join(&format!("?{}", trimmed)).ok()
    };

    parsed
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

/// First value of `key`, treating empty values as absent
pub fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}
