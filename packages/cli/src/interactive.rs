//! Interactive menu for browsing outages.
//!
//! Mirrors the web views: pick a day, narrow by category, district or text,
//! open an outage, look up an address. Every choice is a store action, so
//! the selected day is remembered for the next session.

use std::sync::Arc;

use blackout_map_cli_utils::{MultiProgress, Spinner, with_spinner};
use blackout_map_outage_models::{CategoryFilter, OutageCategory};
use blackout_map_store::{
    AddressAutocomplete, DEFAULT_NEIGHBOR_LIMIT, MIN_SUGGESTION_CHARS, OutageStore, Outcome,
};
use chrono::NaiveDate;
use dialoguer::{Input, MultiSelect, Select};

use crate::render;

/// Top-level actions in the interactive menu.
enum MenuAction {
    ShowOutages,
    PreviousDay,
    NextDay,
    PickDate,
    FilterCategory,
    FilterDistricts,
    Search,
    ClearFilters,
    OpenOutage,
    LookUpAddress,
    Statistics,
    Quit,
}

impl MenuAction {
    const ALL: &[Self] = &[
        Self::ShowOutages,
        Self::PreviousDay,
        Self::NextDay,
        Self::PickDate,
        Self::FilterCategory,
        Self::FilterDistricts,
        Self::Search,
        Self::ClearFilters,
        Self::OpenOutage,
        Self::LookUpAddress,
        Self::Statistics,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ShowOutages => "Show outages",
            Self::PreviousDay => "Previous day",
            Self::NextDay => "Next day",
            Self::PickDate => "Pick a date",
            Self::FilterCategory => "Filter by type",
            Self::FilterDistricts => "Filter by district",
            Self::Search => "Search",
            Self::ClearFilters => "Clear filters",
            Self::OpenOutage => "Open an outage",
            Self::LookUpAddress => "Look up an address",
            Self::Statistics => "Statistics",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu loop until the user quits.
///
/// # Errors
///
/// * If a terminal prompt fails
pub async fn run(
    store: &Arc<OutageStore>,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Blackout Map");
    println!();

    let autocomplete = AddressAutocomplete::new(Arc::clone(store));

    reload(store, multi, store.ensure_loaded()).await;

    let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();

    loop {
        let prompt = format!(
            "[{}] {} of {} outage(s)",
            render::selection_summary(&store.selection()),
            store.filtered().len(),
            store.outages().len()
        );
        let idx = Select::new()
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()?;

        match MenuAction::ALL[idx] {
            MenuAction::ShowOutages => print!("{}", render::outage_table(&store.filtered())),
            MenuAction::PreviousDay => reload(store, multi, store.shift_date(-1)).await,
            MenuAction::NextDay => reload(store, multi, store.shift_date(1)).await,
            MenuAction::PickDate => pick_date(store, multi).await?,
            MenuAction::FilterCategory => filter_category(store)?,
            MenuAction::FilterDistricts => filter_districts(store, multi).await?,
            MenuAction::Search => {
                let query: String = Input::new()
                    .with_prompt("Search (street, building, district, description)")
                    .with_initial_text(store.selection().query)
                    .allow_empty(true)
                    .interact_text()?;
                store.set_text_query(query);
            }
            MenuAction::ClearFilters => store.clear_filters(),
            MenuAction::OpenOutage => open_outage(store)?,
            MenuAction::LookUpAddress => look_up_address(store, &autocomplete, multi).await?,
            MenuAction::Statistics => print!("{}", render::stats(&store.category_stats())),
            MenuAction::Quit => return Ok(()),
        }
    }
}

/// Awaits a load behind a spinner and reports a failure without leaving
/// the menu.
async fn reload(
    store: &OutageStore,
    multi: &MultiProgress,
    load: impl std::future::Future<Output = Outcome>,
) {
    if with_spinner(multi, "Loading outages...", load).await == Outcome::Failed {
        eprintln!("{}", store.error().unwrap_or_default());
    }
}

async fn pick_date(
    store: &OutageStore,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw: String = Input::new()
        .with_prompt("Date (YYYY-MM-DD)")
        .default(store.selected_date().to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")?;
    reload(store, multi, store.load_for_date(date)).await;
    Ok(())
}

fn filter_category(store: &OutageStore) -> Result<(), Box<dyn std::error::Error>> {
    let mut labels = vec!["Все"];
    labels.extend(OutageCategory::all().iter().map(|c| c.label()));

    let current = match store.selection().category {
        CategoryFilter::Only(category) => OutageCategory::all()
            .iter()
            .position(|c| *c == category)
            .map_or(0, |i| i + 1),
        _ => 0,
    };

    let idx = Select::new()
        .with_prompt("Outage type")
        .items(&labels)
        .default(current)
        .interact()?;

    store.set_category_filter(
        idx.checked_sub(1)
            .and_then(|i| OutageCategory::all().get(i))
            .map_or(CategoryFilter::All, |c| CategoryFilter::Only(*c)),
    );
    Ok(())
}

async fn filter_districts(
    store: &OutageStore,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = with_spinner(
        multi,
        "Loading districts...",
        store.fetch_district_options(),
    )
    .await;

    let state = store.snapshot();
    if outcome == Outcome::Failed || state.districts.is_empty() {
        eprintln!(
            "{}",
            state
                .district_error
                .unwrap_or_else(|| "No districts available.".to_string())
        );
        return Ok(());
    }

    let names: Vec<&str> = state.districts.iter().map(|d| d.name.as_str()).collect();
    let selected: Vec<bool> = names
        .iter()
        .map(|name| {
            state
                .selection
                .districts
                .iter()
                .any(|d| d.to_lowercase() == name.to_lowercase())
        })
        .collect();

    let picked = MultiSelect::new()
        .with_prompt("Districts (space to toggle, none for all)")
        .items(&names)
        .defaults(&selected)
        .interact()?;

    store.set_district_filter(picked.into_iter().map(|i| names[i].to_string()).collect());
    Ok(())
}

fn open_outage(store: &OutageStore) -> Result<(), Box<dyn std::error::Error>> {
    let filtered = store.filtered();
    if filtered.is_empty() {
        println!("No outages to open.");
        return Ok(());
    }

    let labels: Vec<String> = filtered
        .iter()
        .map(|o| format!("{} | {}", o.category.label(), o.address_line()))
        .collect();
    let idx = Select::new()
        .with_prompt("Outage")
        .items(&labels)
        .default(0)
        .interact()?;

    match store.lookup_by_id(&filtered[idx].id) {
        Some(outage) => print!("{}", render::outage_detail(&outage)),
        None => println!("Outage not found."),
    }
    Ok(())
}

async fn look_up_address(
    store: &OutageStore,
    autocomplete: &AddressAutocomplete,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt("Street and building")
        .interact_text()?;

    autocomplete.input(&input);
    if input.trim().chars().count() < MIN_SUGGESTION_CHARS {
        println!("Type at least {MIN_SUGGESTION_CHARS} characters.");
        return Ok(());
    }

    let spinner = Spinner::start(multi, "Searching addresses...");
    autocomplete.settle().await;
    let state = store.snapshot();
    let suggestions = state.suggestions;
    spinner.finish(format!("{} address(es) found", suggestions.len()));

    if let Some(error) = state.suggestion_error {
        eprintln!("{error}");
        return Ok(());
    }
    if suggestions.is_empty() {
        println!("No matching addresses.");
        return Ok(());
    }

    let labels: Vec<String> = suggestions.iter().map(ToString::to_string).collect();
    let idx = Select::new()
        .with_prompt("Address")
        .items(&labels)
        .default(0)
        .interact()?;

    let building_id = &suggestions[idx].building_id;
    let outcome = with_spinner(
        multi,
        "Loading address...",
        store.load_address_info(building_id, DEFAULT_NEIGHBOR_LIMIT),
    )
    .await;

    let state = store.snapshot();
    match (outcome, state.address_info) {
        (Outcome::Applied, Some(info)) => print!("{}", render::address_detail(&info)),
        _ => eprintln!("{}", state.address_error.unwrap_or_default()),
    }
    Ok(())
}
