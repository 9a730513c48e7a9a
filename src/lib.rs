//! # Stopover
//!
//! A flight search client. The query builder collects a trip query and
//! encodes it as results-view URL parameters; the results view fetches
//! proposals from the backend, turns them into display records and lets the
//! caller filter, sort, paginate and inspect a single flight.

pub mod autocomplete;
pub mod client;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod results;
pub mod transform;

use thiserror::Error;

// Re-export main types for convenience
pub use autocomplete::AutocompleteField;
pub use client::{AirportsApi, FetchError, FlightsApi, HttpBackend};
pub use config::Config;
pub use model::{
    AirportOption, DisplayFlight, FilterState, RawProposal, SearchQuery, SortOption, TripType,
};
pub use query::QueryBuilder;
pub use results::{FetchState, ResultsView};

/// Error types for the stopover library
#[derive(Error, Debug)]
pub enum StopoverError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Invalid date format: {0}")]
    DateParseError(String),

    #[error("Parsing failed: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Load a results view for a search URL (or bare query string) against the
/// backend configured in the environment.
///
/// # Example
/// ```no_run
/// use stopover::{search_flights, FetchState};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let view = search_flights("/flights?origin=YYZ&destination=SEA&departure=2024-03-01").await?;
/// if let FetchState::Success = view.state() {
///     println!("Found {} flights", view.flights().len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search_flights(url: &str) -> Result<ResultsView<HttpBackend>, StopoverError> {
    let config = Config::from_env();
    let backend = HttpBackend::new(&config)?;
    let mut view = ResultsView::new(backend);
    view.load(url).await;
    Ok(view)
}
