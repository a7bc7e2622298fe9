#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Outage record store.
//!
//! [`OutageStore`] is the single source of truth for the view layer: the
//! selected day's outages, the filtered view, the current
//! [`FilterSelection`](blackout_map_outage_models::FilterSelection),
//! loading/error flags, district options, autocomplete candidates and the
//! last address detail. It is constructed once at startup and shared by
//! `Arc`; nothing in this crate is global.
//!
//! Network-backed actions never return errors. Failures are captured into
//! the state's error strings and reported through [`Outcome`]; retrying is
//! always a fresh call.
//!
//! Each network-backed action takes a ticket from a per-resource counter
//! before awaiting the gateway. A response is applied only if its ticket
//! is still the latest for that resource, so a slow response for a date
//! the user already navigated away from can never overwrite the newer one.

pub mod autocomplete;
pub mod clock;
pub mod debounce;
pub mod persist;
pub mod state;

#[cfg(test)]
mod fake;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use blackout_map_filter::{CategoryCount, category_counts};
use blackout_map_gateway::OutageGateway;
use blackout_map_outage_models::{
    AddressInfo, AddressSuggestion, CategoryFilter, FilterSelection, OutageRecord,
};
use chrono::{NaiveDate, TimeDelta};

pub use autocomplete::AddressAutocomplete;
pub use clock::{Clock, FixedClock, SystemClock, as_of_for};
pub use persist::{DateStore, FileDateStore, MemoryDateStore, PersistError};
pub use state::{Action, StoreState, reduce};

/// Inputs shorter than this (in characters, after trimming) never reach
/// the backend.
pub const MIN_SUGGESTION_CHARS: usize = 3;

/// Neighbor count requested for address detail when the caller has no
/// preference.
pub const DEFAULT_NEIGHBOR_LIMIT: u32 = 5;

const LOAD_ERROR: &str = "Ошибка при загрузке данных";
const DISTRICTS_ERROR: &str = "Не удалось загрузить список районов";
const SUGGESTIONS_ERROR: &str = "Ошибка при поиске адресов";
const ADDRESS_ERROR: &str = "Ошибка при загрузке данных адреса";

/// What happened to a network-backed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response was applied to the state.
    Applied,
    /// The request failed; the state carries the error message.
    Failed,
    /// A newer request for the same resource was issued meanwhile; the
    /// response was discarded.
    Superseded,
    /// No request was needed.
    Skipped,
}

#[derive(Default)]
struct Tickets {
    outages: u64,
    suggestions: u64,
    address: u64,
}

struct Inner {
    state: StoreState,
    tickets: Tickets,
}

/// Process-wide outage state with named actions.
pub struct OutageStore {
    gateway: Arc<dyn OutageGateway>,
    clock: Arc<dyn Clock>,
    dates: Arc<dyn DateStore>,
    inner: RwLock<Inner>,
    district_fetch: tokio::sync::Mutex<()>,
}

impl OutageStore {
    /// Creates a store using the system clock.
    ///
    /// The selected date is rehydrated from `dates`, falling back to today
    /// when nothing usable is saved. No data is fetched yet.
    #[must_use]
    pub fn new(gateway: Arc<dyn OutageGateway>, dates: Arc<dyn DateStore>) -> Self {
        Self::with_clock(gateway, dates, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit clock.
    #[must_use]
    pub fn with_clock(
        gateway: Arc<dyn OutageGateway>,
        dates: Arc<dyn DateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let date = dates.load().unwrap_or_else(|| clock.today());
        log::debug!("Store starting with selected date {date}");
        Self {
            gateway,
            clock,
            dates,
            inner: RwLock::new(Inner {
                state: StoreState::new(date),
                tickets: Tickets::default(),
            }),
            district_fetch: tokio::sync::Mutex::new(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, action: Action) {
        reduce(&mut self.write().state, action);
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// A copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.read().state.clone()
    }

    /// The filtered view.
    #[must_use]
    pub fn filtered(&self) -> Vec<OutageRecord> {
        self.read().state.filtered.clone()
    }

    /// The full collection for the selected day.
    #[must_use]
    pub fn outages(&self) -> Vec<OutageRecord> {
        self.read().state.outages.clone()
    }

    /// Current filter choices.
    #[must_use]
    pub fn selection(&self) -> FilterSelection {
        self.read().state.selection.clone()
    }

    /// The selected day.
    #[must_use]
    pub fn selected_date(&self) -> NaiveDate {
        self.read().state.selection.date
    }

    /// Whether an outage load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().state.is_loading
    }

    /// Last outage load failure.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().state.error.clone()
    }

    /// Whether any of category, districts or query narrows the view.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.read().state.selection.has_active_filters()
    }

    /// Per-category counts of the filtered view.
    #[must_use]
    pub fn category_stats(&self) -> Vec<CategoryCount> {
        category_counts(&self.read().state.filtered)
    }

    /// Finds an outage in the full collection by id.
    ///
    /// Absence is an expected outcome (stale link, another day) and is
    /// reported as `None`.
    #[must_use]
    pub fn lookup_by_id(&self, id: &str) -> Option<OutageRecord> {
        self.read()
            .state
            .outages
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Current autocomplete candidates.
    #[must_use]
    pub fn suggestions(&self) -> Vec<AddressSuggestion> {
        self.read().state.suggestions.clone()
    }

    /// Detail for the last requested building.
    #[must_use]
    pub fn address_info(&self) -> Option<AddressInfo> {
        self.read().state.address_info.clone()
    }

    // ── Local refinements ───────────────────────────────────────────

    /// Selects a category (or all) and recomputes the filtered view.
    pub fn set_category_filter(&self, category: CategoryFilter) {
        self.dispatch(Action::SetCategory(category));
    }

    /// Selects districts (empty for all) and recomputes the filtered view.
    pub fn set_district_filter(&self, districts: Vec<String>) {
        self.dispatch(Action::SetDistricts(districts));
    }

    /// Sets the free-text query and recomputes the filtered view.
    pub fn set_text_query(&self, query: impl Into<String>) {
        self.dispatch(Action::SetQuery(query.into()));
    }

    /// Resets category, districts and query. The date stays selected.
    pub fn clear_filters(&self) {
        self.dispatch(Action::ClearFilters);
    }

    /// Drops autocomplete candidates without a request.
    pub fn clear_suggestions(&self) {
        let mut inner = self.write();
        // Invalidate anything still in flight.
        inner.tickets.suggestions += 1;
        reduce(&mut inner.state, Action::SuggestionsCleared);
    }

    // ── Network-backed actions ──────────────────────────────────────

    /// Selects `date` and replaces the collection with that day's outages.
    ///
    /// Past days are requested as of 23:59:59; today and later as of now.
    /// The date is persisted whether or not the fetch succeeds. On failure
    /// the collection is cleared and [`StoreState::error`] is set.
    pub async fn load_for_date(&self, date: NaiveDate) -> Outcome {
        let ticket = {
            let mut inner = self.write();
            inner.tickets.outages += 1;
            reduce(&mut inner.state, Action::LoadStarted(date));
            inner.tickets.outages
        };

        self.persist_date(date).await;

        let result = self.request_outages(date).await;

        let mut inner = self.write();
        if inner.tickets.outages != ticket {
            log::debug!("Discarding superseded outage response for {date}");
            return Outcome::Superseded;
        }

        match result {
            Ok(outages) => {
                log::info!("Loaded {} outage(s) for {date}", outages.len());
                reduce(&mut inner.state, Action::LoadSucceeded { date, outages });
                Outcome::Applied
            }
            Err(message) => {
                reduce(&mut inner.state, Action::LoadFailed(message));
                Outcome::Failed
            }
        }
    }

    /// Loads the selected day unless it is already loaded.
    pub async fn ensure_loaded(&self) -> Outcome {
        let (date, loaded) = {
            let inner = self.read();
            (
                inner.state.selection.date,
                inner.state.loaded_date == Some(inner.state.selection.date),
            )
        };
        if loaded {
            return Outcome::Skipped;
        }
        self.load_for_date(date).await
    }

    /// Moves the selected date by `days` (negative for earlier) and loads it.
    pub async fn shift_date(&self, days: i64) -> Outcome {
        let current = self.selected_date();
        let Some(date) = current.checked_add_signed(TimeDelta::days(days)) else {
            log::warn!("Cannot shift {current} by {days} day(s)");
            return Outcome::Skipped;
        };
        self.load_for_date(date).await
    }

    /// Fetches the district reference list once per store.
    ///
    /// Failure leaves the options empty and sets
    /// [`StoreState::district_error`]; the rest of the store is unaffected.
    /// Concurrent callers share one request.
    pub async fn fetch_district_options(&self) -> Outcome {
        let _fetching = self.district_fetch.lock().await;
        if !self.read().state.districts.is_empty() {
            return Outcome::Skipped;
        }

        match self.gateway.fetch_districts().await {
            Ok(districts) => {
                log::debug!("Loaded {} district(s)", districts.len());
                self.dispatch(Action::DistrictsLoaded(districts));
                Outcome::Applied
            }
            Err(e) => {
                log::warn!("Failed to load districts: {e}");
                self.dispatch(Action::DistrictsFailed(DISTRICTS_ERROR.to_string()));
                Outcome::Failed
            }
        }
    }

    /// Fetches address candidates for `partial`.
    ///
    /// Inputs shorter than [`MIN_SUGGESTION_CHARS`] clear the candidates
    /// without a request. Callers driving this from keystrokes should go
    /// through [`AddressAutocomplete`], which debounces.
    pub async fn fetch_address_suggestions(&self, partial: &str) -> Outcome {
        let input = partial.trim();
        if input.chars().count() < MIN_SUGGESTION_CHARS {
            self.clear_suggestions();
            return Outcome::Skipped;
        }

        let ticket = {
            let mut inner = self.write();
            inner.tickets.suggestions += 1;
            inner.tickets.suggestions
        };

        let result = self.request_suggestions(input).await;

        let mut inner = self.write();
        if inner.tickets.suggestions != ticket {
            log::debug!("Discarding superseded suggestions for {input:?}");
            return Outcome::Superseded;
        }

        match result {
            Ok(suggestions) => {
                reduce(&mut inner.state, Action::SuggestionsLoaded(suggestions));
                Outcome::Applied
            }
            Err(message) => {
                reduce(&mut inner.state, Action::SuggestionsFailed(message));
                Outcome::Failed
            }
        }
    }

    /// Fetches outages at `building_id` and its neighbors as of the
    /// selected date, replacing any previous detail.
    pub async fn load_address_info(&self, building_id: &str, limit_neighbors: u32) -> Outcome {
        let (ticket, date) = {
            let mut inner = self.write();
            inner.tickets.address += 1;
            reduce(&mut inner.state, Action::AddressLoadStarted);
            (inner.tickets.address, inner.state.selection.date)
        };
        let result = self
            .request_address_info(building_id, date, limit_neighbors)
            .await;

        let mut inner = self.write();
        if inner.tickets.address != ticket {
            log::debug!("Discarding superseded address detail for {building_id}");
            return Outcome::Superseded;
        }

        match result {
            Ok(info) => {
                reduce(&mut inner.state, Action::AddressLoaded(info));
                Outcome::Applied
            }
            Err(message) => {
                reduce(&mut inner.state, Action::AddressFailed(message));
                Outcome::Failed
            }
        }
    }

    // ── Per-request queries ─────────────────────────────────────────
    //
    // These answer one caller without touching the selection, the shared
    // resource slots or their tickets, so concurrent callers asking for
    // different days or buildings never see each other's results.

    /// The outages for `date`.
    ///
    /// Served from the loaded collection when it holds that day, fetched
    /// otherwise.
    ///
    /// # Errors
    ///
    /// * The user-facing load error if the backend request fails
    pub async fn outages_on(&self, date: NaiveDate) -> Result<Vec<OutageRecord>, String> {
        {
            let inner = self.read();
            if inner.state.loaded_date == Some(date) {
                return Ok(inner.state.outages.clone());
            }
        }
        self.request_outages(date).await
    }

    /// Address candidates for `partial`; empty without a request when the
    /// trimmed input is shorter than [`MIN_SUGGESTION_CHARS`].
    ///
    /// # Errors
    ///
    /// * The user-facing search error if the backend request fails
    pub async fn suggestions_for(&self, partial: &str) -> Result<Vec<AddressSuggestion>, String> {
        let input = partial.trim();
        if input.chars().count() < MIN_SUGGESTION_CHARS {
            return Ok(Vec::new());
        }
        self.request_suggestions(input).await
    }

    /// Outages at `building_id` and its neighbors on `date`.
    ///
    /// # Errors
    ///
    /// * The user-facing address error if the backend request fails
    pub async fn address_info_on(
        &self,
        building_id: &str,
        date: NaiveDate,
        limit_neighbors: u32,
    ) -> Result<AddressInfo, String> {
        self.request_address_info(building_id, date, limit_neighbors)
            .await
    }

    // ── Backend requests ────────────────────────────────────────────

    async fn persist_date(&self, date: NaiveDate) {
        let dates = Arc::clone(&self.dates);
        match tokio::task::spawn_blocking(move || dates.save(date)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Failed to persist selected date {date}: {e}"),
            Err(e) => log::warn!("Date persistence task failed for {date}: {e}"),
        }
    }

    async fn request_outages(&self, date: NaiveDate) -> Result<Vec<OutageRecord>, String> {
        let as_of = as_of_for(date, self.clock.now());
        log::info!("Loading outages for {date} (as of {as_of})");
        self.gateway.fetch_outages(as_of).await.map_err(|e| {
            log::error!("Failed to load outages for {date}: {e}");
            LOAD_ERROR.to_string()
        })
    }

    async fn request_suggestions(&self, input: &str) -> Result<Vec<AddressSuggestion>, String> {
        self.gateway
            .fetch_address_suggestions(input)
            .await
            .map_err(|e| {
                log::warn!("Failed to fetch suggestions for {input:?}: {e}");
                SUGGESTIONS_ERROR.to_string()
            })
    }

    async fn request_address_info(
        &self,
        building_id: &str,
        date: NaiveDate,
        limit_neighbors: u32,
    ) -> Result<AddressInfo, String> {
        let as_of = as_of_for(date, self.clock.now());
        log::info!("Loading address detail for {building_id} as of {as_of}");
        self.gateway
            .fetch_address_info(building_id, as_of, limit_neighbors)
            .await
            .map_err(|e| {
                log::error!("Failed to load address detail for {building_id}: {e}");
                ADDRESS_ERROR.to_string()
            })
    }
}
