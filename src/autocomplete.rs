//! Debounced airport lookup for a single input field
//!
//! Each [`AutocompleteField`] owns at most one lookup task. The task sleeps
//! for the debounce interval and then queries the backend; a newer input
//! aborts it, whether it is still waiting or already has a request in
//! flight. Candidates are published on a `watch` channel tagged with the
//! input generation that produced them, so a late result from a superseded
//! lookup is dropped instead of overwriting fresher candidates.

use crate::client::AirportsApi;
use crate::model::AirportOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Queries shorter than this never reach the network
pub const MIN_QUERY_CHARS: usize = 2;

/// Quiet period after the last keystroke before a lookup is sent
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Current dropdown contents of a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    generation: u64,
    options: Vec<AirportOption>,
    loading: bool,
}

impl Candidates {
    pub fn options(&self) -> &[AirportOption] {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

pub struct AutocompleteField<A> {
    api: Arc<A>,
    query: String,
    selected: Option<AirportOption>,
    candidates: Arc<watch::Sender<Candidates>>,
    task: Option<JoinHandle<()>>,
}

impl<A> AutocompleteField<A>
where
    A: AirportsApi + Send + Sync + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        let (tx, _rx) = watch::channel(Candidates::default());
        Self {
            api,
            query: String::new(),
            selected: None,
            candidates: Arc::new(tx),
            task: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> Option<&AirportOption> {
        self.selected.as_ref()
    }

    /// Text shown in the input: the selection label, or the typed query
    pub fn display_value(&self) -> String {
        match &self.selected {
            Some(airport) => airport.label(),
            None => self.query.clone(),
        }
    }

    pub fn candidates(&self) -> Candidates {
        self.candidates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Candidates> {
        self.candidates.subscribe()
    }

    /// Handle a keystroke. Clears any selection and schedules a lookup.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input(&mut self, text: impl Into<String>) {
        self.selected = None;
        self.query = text.into();
        self.cancel_pending();

        if self.query.chars().count() < MIN_QUERY_CHARS {
            self.reset_candidates(false);
            return;
        }

        let generation = self.reset_candidates(true);
        let api = Arc::clone(&self.api);
        let candidates = Arc::clone(&self.candidates);
        let query = self.query.clone();

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE).await;
            debug!(query = %query, "Sending airport lookup");

            let options = match api.autocomplete(&query).await {
                Ok(options) => options,
                Err(e) => {
                    warn!(query = %query, error = %e, "Autocomplete failed");
                    Vec::new()
                }
            };

            let published = candidates.send_if_modified(|current| {
                if current.generation != generation {
                    return false;
                }
                current.options = options;
                current.loading = false;
                true
            });
            if !published {
                debug!(query = %query, "Discarding superseded autocomplete result");
            }
        }));
    }

    /// Pick a candidate; the typed query is cleared and the dropdown closes
    pub fn select(&mut self, option: AirportOption) {
        self.cancel_pending();
        self.reset_candidates(false);
        self.query.clear();
        self.selected = Some(option);
    }

    /// Wait until no lookup is pending and return the candidates
    pub async fn settled(&self) -> Candidates {
        let mut rx = self.candidates.subscribe();
        loop {
            {
                let current = rx.borrow_and_update();
                if !current.loading {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                return Candidates::default();
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                debug!("Cancelling superseded airport lookup");
            }
            task.abort();
        }
    }

    /// Start a new generation with no options; returns its id
    fn reset_candidates(&self, loading: bool) -> u64 {
        let mut generation = 0;
        self.candidates.send_modify(|current| {
            current.generation += 1;
            current.options.clear();
            current.loading = loading;
            generation = current.generation;
        });
        generation
    }
}

impl<A> Drop for AutocompleteField<A> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
