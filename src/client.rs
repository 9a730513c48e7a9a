//! HTTP client for the flights backend

use crate::config::Config;
use crate::model::{AirportOption, SearchQuery};
use crate::StopoverError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Failure of a single backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connection refused, DNS, timeout)
    #[error("network error: {0}")]
    Network(String),

    #[error("API request failed with status {0}")]
    Status(u16),

    #[error("API response missing expected data structure: {0}")]
    Malformed(String),
}

impl FetchError {
    fn from_send(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

/// Parameters forwarded to `GET /api/flights`, taken verbatim from the
/// results-view URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSearchParams {
    pub origin: String,
    pub destination: String,
    pub departure: String,
    pub adults: String,
    pub trip_type: String,
    pub return_date: Option<String>,
}

impl FlightSearchParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("origin", self.origin.clone()),
            ("destination", self.destination.clone()),
            ("departure", self.departure.clone()),
            ("adults", self.adults.clone()),
            ("tripType", self.trip_type.clone()),
        ];
        if let Some(ret) = &self.return_date {
            query.push(("return", ret.clone()));
        }
        query
    }
}

impl From<&SearchQuery> for FlightSearchParams {
    fn from(query: &SearchQuery) -> Self {
        let mut params = FlightSearchParams {
            origin: String::new(),
            destination: String::new(),
            departure: String::new(),
            adults: String::new(),
            trip_type: String::new(),
            return_date: None,
        };
        for (key, value) in query.to_params() {
            match key {
                "origin" => params.origin = value,
                "destination" => params.destination = value,
                "departure" => params.departure = value,
                "adults" => params.adults = value,
                "tripType" => params.trip_type = value,
                "return" => params.return_date = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// Flight search endpoint
pub trait FlightsApi {
    /// Run a search and return the decoded response body
    fn search_flights(
        &self,
        params: &FlightSearchParams,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;

    /// Backend address shown to the user when it cannot be reached
    fn backend_url(&self) -> &str;
}

/// Airport autocomplete endpoint
pub trait AirportsApi {
    fn autocomplete(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<AirportOption>, FetchError>> + Send;
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    items: Vec<Value>,
}

/// reqwest-backed implementation of both endpoints
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: Client,
    api_base: String,
    backend_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, StopoverError> {
        debug!(api_base = %config.api_base(), "Creating backend client");
        let http_client = Client::builder()
            .user_agent(concat!("stopover/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.api_base(),
            backend_url: config.backend_url().to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl FlightsApi for HttpBackend {
    #[instrument(level = "info", skip(self, params), fields(origin = %params.origin, destination = %params.destination))]
    async fn search_flights(&self, params: &FlightSearchParams) -> Result<Value, FetchError> {
        let url = format!("{}/flights", self.api_base);
        info!(url = %url, "Requesting flight search");

        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .get(&url)
            .query(&params.to_query())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Flight search request could not be sent");
                FetchError::from_send(e)
            })?;
        let status = response.status();

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "HTTP request completed"
        );

        if !status.is_success() {
            error!(status = %status, "Flight search failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            error!(error = %e, "Flight search response is not valid JSON");
            FetchError::Malformed(e.to_string())
        })
    }

    fn backend_url(&self) -> &str {
        &self.backend_url
    }
}

impl AirportsApi for HttpBackend {
    #[instrument(level = "debug", skip(self))]
    async fn autocomplete(&self, query: &str) -> Result<Vec<AirportOption>, FetchError> {
        let url = format!("{}/airports/autocomplete", self.api_base);
        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(FetchError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: AutocompleteResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let options: Vec<AirportOption> = body
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<AirportOption>(item) {
                Ok(option) => Some(option),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed airport candidate");
                    None
                }
            })
            .collect();

        debug!(candidates = options.len(), "Autocomplete completed");
        Ok(options)
    }
}
