//! Results view: fetches a search from URL parameters and holds the
//! filter, sort, page and selection state the user drives.

use crate::client::{FetchError, FlightSearchParams, FlightsApi};
use crate::model::{DisplayFlight, FilterState, SortOption, TripType};
use crate::pipeline;
use crate::query::{param, url_params};
use crate::transform::transform_proposals;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

pub const MISSING_PARAMS_MESSAGE: &str = "Missing required search parameters in URL";
pub const INVALID_RESPONSE_MESSAGE: &str = "The API response format was invalid";
pub const NO_FLIGHTS_MESSAGE: &str = "No flights found from API";

/// Fetch lifecycle of the view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

/// Why a load ended in [`FetchState::Error`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    MissingParams,
    Fetch(FetchError),
    InvalidResponse,
    NoFlights,
}

impl LoadError {
    /// Message shown to the user; `backend_url` is named for transport failures
    pub fn user_message(&self, backend_url: &str) -> String {
        match self {
            LoadError::MissingParams => MISSING_PARAMS_MESSAGE.to_string(),
            LoadError::Fetch(FetchError::Network(_)) => format!(
                "Cannot connect to backend server. Please ensure the backend is running at {}",
                backend_url
            ),
            LoadError::Fetch(FetchError::Status(code)) => format!(
                "The API server returned an error: API request failed with status {}",
                code
            ),
            LoadError::Fetch(FetchError::Malformed(_)) | LoadError::InvalidResponse => {
                INVALID_RESPONSE_MESSAGE.to_string()
            }
            LoadError::NoFlights => NO_FLIGHTS_MESSAGE.to_string(),
        }
    }
}

/// Read the search parameters from a results-view URL.
///
/// `origin`, `destination` and `departure` are required; `adults` defaults
/// to `1` and `tripType` to `one-way`.
pub fn search_params_from_url(url: &str) -> Option<FlightSearchParams> {
    let params = url_params(url);
    Some(FlightSearchParams {
        origin: param(&params, "origin")?.to_string(),
        destination: param(&params, "destination")?.to_string(),
        departure: param(&params, "departure")?.to_string(),
        adults: param(&params, "adults").unwrap_or("1").to_string(),
        trip_type: param(&params, "tripType")
            .unwrap_or(TripType::OneWay.as_str())
            .to_string(),
        return_date: param(&params, "return").map(str::to_string),
    })
}

/// Check the response shape and transform its proposals
pub fn flights_from_response(body: &Value) -> Result<Vec<DisplayFlight>, LoadError> {
    let proposals = body
        .get("proposals")
        .and_then(Value::as_array)
        .ok_or(LoadError::InvalidResponse)?;

    let flights = transform_proposals(proposals);
    if flights.is_empty() {
        return Err(LoadError::NoFlights);
    }
    Ok(flights)
}

pub struct ResultsView<A> {
    api: A,
    state: FetchState,
    params: Option<FlightSearchParams>,
    flights: Vec<DisplayFlight>,
    airlines: Vec<String>,
    filters: FilterState,
    sort: SortOption,
    current_page: usize,
    selected_flight: Option<usize>,
    show_filters: bool,
    show_all_airlines: bool,
}

impl<A: FlightsApi> ResultsView<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: FetchState::Idle,
            params: None,
            flights: Vec::new(),
            airlines: Vec::new(),
            filters: FilterState::default(),
            sort: SortOption::default(),
            current_page: 1,
            selected_flight: None,
            show_filters: false,
            show_all_airlines: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch results for `url`. Enters `Loading` before any network call and
    /// always ends in `Success` or `Error`; failures are not retried.
    #[instrument(level = "info", skip(self))]
    pub async fn load(&mut self, url: &str) {
        self.state = FetchState::Loading;
        self.params = None;
        self.flights.clear();
        self.airlines.clear();

        match self.fetch(url).await {
            Ok(flights) => {
                self.airlines = pipeline::airline_facets(&flights);
                info!(
                    flights = flights.len(),
                    airlines = self.airlines.len(),
                    "Loaded flight results"
                );
                self.flights = flights;
                self.state = FetchState::Success;
            }
            Err(e) => {
                let message = e.user_message(self.api.backend_url());
                error!(error = ?e, message = %message, "Error fetching flight data");
                self.state = FetchState::Error(message);
            }
        }
    }

    async fn fetch(&mut self, url: &str) -> Result<Vec<DisplayFlight>, LoadError> {
        let params = search_params_from_url(url).ok_or(LoadError::MissingParams)?;
        self.params = Some(params.clone());

        let body = self
            .api
            .search_flights(&params)
            .await
            .map_err(LoadError::Fetch)?;
        flights_from_response(&body)
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FetchState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Parameters of the last load that had all required fields
    pub fn params(&self) -> Option<&FlightSearchParams> {
        self.params.as_ref()
    }

    /// All flights in API order
    pub fn flights(&self) -> &[DisplayFlight] {
        &self.flights
    }

    /// Airline facet values
    pub fn airlines(&self) -> &[String] {
        &self.airlines
    }

    /// Facets shown in the filter panel
    pub fn displayed_airlines(&self) -> &[String] {
        if self.show_all_airlines {
            &self.airlines
        } else {
            let n = self.airlines.len().min(pipeline::COLLAPSED_AIRLINE_COUNT);
            &self.airlines[..n]
        }
    }

    pub fn has_more_airlines(&self) -> bool {
        self.airlines.len() > pipeline::COLLAPSED_AIRLINE_COUNT
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn show_filters(&self) -> bool {
        self.show_filters
    }

    pub fn show_all_airlines(&self) -> bool {
        self.show_all_airlines
    }

    /// Flights passing the current filters, in API order
    pub fn filtered_flights(&self) -> Vec<&DisplayFlight> {
        pipeline::filter_flights(&self.flights, &self.filters)
    }

    /// Filtered flights in the current sort order
    pub fn sorted_flights(&self) -> Vec<&DisplayFlight> {
        let mut flights = self.filtered_flights();
        pipeline::sort_flights(&mut flights, self.sort);
        flights
    }

    pub fn total_pages(&self) -> usize {
        pipeline::total_pages(self.filtered_flights().len())
    }

    /// Flights shown on the current page
    pub fn page_flights(&self) -> Vec<&DisplayFlight> {
        let sorted = self.sorted_flights();
        pipeline::paginate(&sorted, self.current_page).to_vec()
    }

    pub fn selected_flight(&self) -> Option<&DisplayFlight> {
        let id = self.selected_flight?;
        self.flights.iter().find(|f| f.id == id)
    }

    /// Open the summary for flight `id`; unknown ids are ignored
    pub fn select_flight(&mut self, id: usize) -> bool {
        if self.flights.iter().any(|f| f.id == id) {
            self.selected_flight = Some(id);
            true
        } else {
            false
        }
    }

    pub fn back_to_results(&mut self) {
        self.selected_flight = None;
    }

    pub fn toggle_checked_bag(&mut self) {
        self.filters.checked_bag = !self.filters.checked_bag;
    }

    pub fn toggle_hand_baggage(&mut self) {
        self.filters.hand_baggage = !self.filters.hand_baggage;
    }

    pub fn toggle_airline(&mut self, airline: &str) {
        self.filters.toggle_airline(airline);
        debug!(airline, selected = self.filters.is_airline_selected(airline), "Toggled airline filter");
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
    }

    /// Jump to `page`, clamped to `1..=total_pages`
    pub fn go_to_page(&mut self, page: usize) {
        let last = self.total_pages().max(1);
        self.current_page = page.clamp(1, last);
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    pub fn toggle_filter_panel(&mut self) {
        self.show_filters = !self.show_filters;
    }

    pub fn toggle_show_all_airlines(&mut self) {
        self.show_all_airlines = !self.show_all_airlines;
    }

    /// Reset the view for a new search over the current results.
    pub fn new_search(&mut self) {
        self.selected_flight = None;
        self.filters.clear();
        self.sort = SortOption::Best;
        self.current_page = 1;
        self.show_filters = false;
    }
}
