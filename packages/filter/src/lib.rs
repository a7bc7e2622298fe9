#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure filter engine for outage records.
//!
//! Applies a [`FilterSelection`] to a day's outage collection. Category,
//! district and free-text predicates are combined with logical AND; the
//! selection's date is ignored here because a date change refetches the
//! collection from the backend instead.
//!
//! Everything in this crate is side-effect free and deterministic, so the
//! store can call [`filter_outages`] after every state transition.

use blackout_map_outage_models::{CategoryFilter, FilterSelection, OutageCategory, OutageRecord};
use serde::Serialize;

/// Returns the records of `outages` that satisfy every active predicate of
/// `selection`, in their original order.
#[must_use]
pub fn filter_outages(outages: &[OutageRecord], selection: &FilterSelection) -> Vec<OutageRecord> {
    let predicate = Predicate::new(selection);
    outages
        .iter()
        .filter(|record| predicate.matches(record))
        .cloned()
        .collect()
}

/// Whether a single record satisfies `selection`.
#[must_use]
pub fn matches(record: &OutageRecord, selection: &FilterSelection) -> bool {
    Predicate::new(selection).matches(record)
}

/// A selection with its districts and query pre-normalized, so the
/// lowercasing happens once per filter pass instead of once per record.
struct Predicate<'a> {
    category: &'a CategoryFilter,
    districts: Vec<String>,
    query: Option<String>,
}

impl<'a> Predicate<'a> {
    fn new(selection: &'a FilterSelection) -> Self {
        let query = selection.query.trim().to_lowercase();
        Self {
            category: &selection.category,
            districts: selection
                .districts
                .iter()
                .map(|d| d.trim().to_lowercase())
                .collect(),
            query: (!query.is_empty()).then_some(query),
        }
    }

    fn matches(&self, record: &OutageRecord) -> bool {
        self.matches_category(record) && self.matches_district(record) && self.matches_query(record)
    }

    fn matches_category(&self, record: &OutageRecord) -> bool {
        match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => record.category == *category,
            CategoryFilter::Unrecognized(_) => false,
        }
    }

    fn matches_district(&self, record: &OutageRecord) -> bool {
        if self.districts.is_empty() {
            return true;
        }
        record.district_names().iter().any(|name| {
            let name = name.to_lowercase();
            self.districts.iter().any(|selected| *selected == name)
        })
    }

    fn matches_query(&self, record: &OutageRecord) -> bool {
        let Some(query) = &self.query else {
            return true;
        };
        record
            .searchable_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(query.as_str()))
    }
}

/// Number of outages of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// The category.
    pub category: OutageCategory,
    /// How many outages have it.
    pub count: usize,
}

/// Counts outages per category.
///
/// Known categories come first in [`OutageCategory::all`] order, followed
/// by [`OutageCategory::Unknown`] if any record carries it. Categories with
/// no outages are omitted.
#[must_use]
pub fn category_counts(outages: &[OutageRecord]) -> Vec<CategoryCount> {
    OutageCategory::all()
        .iter()
        .copied()
        .chain(std::iter::once(OutageCategory::Unknown))
        .filter_map(|category| {
            let count = outages.iter().filter(|r| r.category == category).count();
            (count > 0).then_some(CategoryCount { category, count })
        })
        .collect()
}
