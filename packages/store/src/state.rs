//! Store state and its transitions.
//!
//! [`reduce`] is the only place state changes. Every transition that
//! touches the collection or the selection finishes by recomputing the
//! filtered view, so `filtered` always equals
//! `filter_outages(&outages, &selection)`.

use blackout_map_filter::filter_outages;
use blackout_map_outage_models::{
    AddressInfo, AddressSuggestion, CategoryFilter, District, FilterSelection, OutageRecord,
};
use chrono::NaiveDate;

/// Everything the view layer can read.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    /// The selected day's full outage collection.
    pub outages: Vec<OutageRecord>,
    /// `outages` narrowed by the selection.
    pub filtered: Vec<OutageRecord>,
    /// Current filter choices.
    pub selection: FilterSelection,
    /// Day `outages` was fetched for; `None` until a load succeeds.
    pub loaded_date: Option<NaiveDate>,
    /// Whether an outage load is in flight.
    pub is_loading: bool,
    /// Last outage load failure, user-facing.
    pub error: Option<String>,
    /// District reference list for filter options.
    pub districts: Vec<District>,
    /// Last district list failure. Non-fatal: options stay empty.
    pub district_error: Option<String>,
    /// Current autocomplete candidates.
    pub suggestions: Vec<AddressSuggestion>,
    /// Last autocomplete failure.
    pub suggestion_error: Option<String>,
    /// Detail for the last requested building.
    pub address_info: Option<AddressInfo>,
    /// Whether an address detail load is in flight.
    pub is_address_loading: bool,
    /// Last address detail failure.
    pub address_error: Option<String>,
}

impl StoreState {
    /// Empty state with `date` selected.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            outages: Vec::new(),
            filtered: Vec::new(),
            selection: FilterSelection::for_date(date),
            loaded_date: None,
            is_loading: false,
            error: None,
            districts: Vec::new(),
            district_error: None,
            suggestions: Vec::new(),
            suggestion_error: None,
            address_info: None,
            is_address_loading: false,
            address_error: None,
        }
    }

    fn recompute_filtered(&mut self) {
        self.filtered = filter_outages(&self.outages, &self.selection);
    }
}

/// A named state transition.
#[derive(Debug, Clone)]
pub enum Action {
    /// An outage load for this day was issued.
    LoadStarted(NaiveDate),
    /// The outage load for this day returned.
    LoadSucceeded {
        /// Day the outages belong to.
        date: NaiveDate,
        /// The full collection.
        outages: Vec<OutageRecord>,
    },
    /// The outage load failed.
    LoadFailed(String),
    /// Category selection changed.
    SetCategory(CategoryFilter),
    /// District selection changed.
    SetDistricts(Vec<String>),
    /// Free-text query changed.
    SetQuery(String),
    /// Category, districts and query reset.
    ClearFilters,
    /// District reference list arrived.
    DistrictsLoaded(Vec<District>),
    /// District reference list failed.
    DistrictsFailed(String),
    /// Autocomplete candidates arrived.
    SuggestionsLoaded(Vec<AddressSuggestion>),
    /// Autocomplete candidates dropped (input too short).
    SuggestionsCleared,
    /// Autocomplete request failed.
    SuggestionsFailed(String),
    /// An address detail load was issued.
    AddressLoadStarted,
    /// Address detail arrived.
    AddressLoaded(AddressInfo),
    /// Address detail failed.
    AddressFailed(String),
}

/// Applies `action` to `state`.
pub fn reduce(state: &mut StoreState, action: Action) {
    match action {
        Action::LoadStarted(date) => {
            state.selection.date = date;
            state.is_loading = true;
            state.error = None;
        }
        Action::LoadSucceeded { date, outages } => {
            state.outages = outages;
            state.loaded_date = Some(date);
            state.is_loading = false;
            state.error = None;
            state.recompute_filtered();
        }
        Action::LoadFailed(message) => {
            // Stale rows from another day must not render against the new
            // date.
            state.outages.clear();
            state.loaded_date = None;
            state.is_loading = false;
            state.error = Some(message);
            state.recompute_filtered();
        }
        Action::SetCategory(category) => {
            state.selection.category = category;
            state.recompute_filtered();
        }
        Action::SetDistricts(districts) => {
            state.selection.districts = districts;
            state.recompute_filtered();
        }
        Action::SetQuery(query) => {
            state.selection.query = query;
            state.recompute_filtered();
        }
        Action::ClearFilters => {
            state.selection.clear();
            state.recompute_filtered();
        }
        Action::DistrictsLoaded(districts) => {
            state.districts = districts;
            state.district_error = None;
        }
        Action::DistrictsFailed(message) => {
            state.districts.clear();
            state.district_error = Some(message);
        }
        Action::SuggestionsLoaded(suggestions) => {
            state.suggestions = suggestions;
            state.suggestion_error = None;
        }
        Action::SuggestionsCleared => {
            state.suggestions.clear();
            state.suggestion_error = None;
        }
        Action::SuggestionsFailed(message) => {
            state.suggestions.clear();
            state.suggestion_error = Some(message);
        }
        Action::AddressLoadStarted => {
            state.address_info = None;
            state.is_address_loading = true;
            state.address_error = None;
        }
        Action::AddressLoaded(info) => {
            state.address_info = Some(info);
            state.is_address_loading = false;
        }
        Action::AddressFailed(message) => {
            state.address_info = None;
            state.is_address_loading = false;
            state.address_error = Some(message);
        }
    }
}
