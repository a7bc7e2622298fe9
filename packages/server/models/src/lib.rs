#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the blackout map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the backend wire types in `blackout_map_outage_models` so the
//! public API contract can evolve independently of the upstream backend.

use blackout_map_filter::CategoryCount;
use blackout_map_outage_models::{
    AddressInfo, AddressSuggestion, CategoryFilter, FilterSelection, NeighborOutage,
    OutageCategory, OutageRecord, format_duration,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An outage as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOutage {
    /// Backend identifier.
    pub id: String,
    /// Utility category.
    pub category: OutageCategory,
    /// Category label for display.
    pub category_label: String,
    /// Marker colour.
    pub color: String,
    /// `"<city>, <street>, д. <building>"`.
    pub address: String,
    /// Street name.
    pub street: String,
    /// Building number.
    pub building_number: String,
    /// Backend building identifier, if known.
    pub building_id: Option<String>,
    /// Administrative district.
    pub district: String,
    /// Colloquial district.
    pub folk_district: String,
    /// Larger colloquial district grouping.
    pub big_folk_district: String,
    /// City.
    pub city: String,
    /// Utility's description.
    pub description: String,
    /// Start of the outage.
    pub start_date: NaiveDateTime,
    /// Scheduled end.
    pub end_date: NaiveDateTime,
    /// Predicted end, only for address detail.
    pub predicted_end_date: Option<NaiveDateTime>,
    /// Scheduled duration, `"<d> дн. <h> ч."`.
    pub duration: String,
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
}

impl From<OutageRecord> for ApiOutage {
    fn from(record: OutageRecord) -> Self {
        Self {
            category_label: record.category.label().to_string(),
            color: record.category.color().to_string(),
            address: record.address_line(),
            duration: format_duration(record.duration()),
            longitude: record.coordinates.longitude,
            latitude: record.coordinates.latitude,
            id: record.id,
            category: record.category,
            street: record.street,
            building_number: record.building_number,
            building_id: record.building_id,
            district: record.district,
            folk_district: record.folk_district,
            big_folk_district: record.big_folk_district,
            city: record.city,
            description: record.description,
            start_date: record.start_date,
            end_date: record.end_date,
            predicted_end_date: record.predicted_end_date,
        }
    }
}

/// Query parameters shared by the list, map and stats endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageQueryParams {
    /// Day to show (`YYYY-MM-DD`). Defaults to the store's selected day.
    pub date: Option<NaiveDate>,
    /// Category name, or `all`.
    pub category: Option<String>,
    /// Comma-separated list of district names.
    pub districts: Option<String>,
    /// Free-text query.
    pub query: Option<String>,
}

impl OutageQueryParams {
    /// The filter selection these parameters describe for `date`.
    #[must_use]
    pub fn selection(&self, date: NaiveDate) -> FilterSelection {
        FilterSelection {
            category: self
                .category
                .as_deref()
                .map(|c| c.parse::<CategoryFilter>().unwrap_or_default())
                .unwrap_or_default(),
            districts: self
                .districts
                .as_deref()
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            query: self.query.clone().unwrap_or_default(),
            date,
        }
    }
}

/// Response of the outage list endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOutageList {
    /// Day the outages belong to.
    pub date: NaiveDate,
    /// Outages that day before filtering.
    pub total_count: usize,
    /// Whether any filter narrowed the list.
    pub has_active_filters: bool,
    /// Filtered outages.
    pub outages: Vec<ApiOutage>,
}

/// Summary statistics for a day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatsSummary {
    /// Day the statistics cover.
    pub date: NaiveDate,
    /// Filtered outage count.
    pub total_count: usize,
    /// Breakdown by category.
    pub by_category: Vec<ApiCategoryCount>,
}

/// Count of outages for a single category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategoryCount {
    pub category: OutageCategory,
    pub label: String,
    pub color: String,
    pub count: usize,
}

impl From<CategoryCount> for ApiCategoryCount {
    fn from(count: CategoryCount) -> Self {
        Self {
            category: count.category,
            label: count.category.label().to_string(),
            color: count.category.color().to_string(),
            count: count.count,
        }
    }
}

/// Query parameters for the address detail endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressQueryParams {
    /// Day to look at; the selected day when absent.
    pub date: Option<NaiveDate>,
    /// How many neighboring buildings to include.
    #[serde(alias = "limit_neighbors")]
    pub limit_neighbors: Option<u32>,
}

/// A neighboring building with an outage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNeighbor {
    pub street: String,
    pub building: String,
    pub building_id: String,
    pub category: OutageCategory,
    pub category_label: String,
}

impl From<NeighborOutage> for ApiNeighbor {
    fn from(neighbor: NeighborOutage) -> Self {
        Self {
            category_label: neighbor.category.label().to_string(),
            street: neighbor.street,
            building: neighbor.building,
            building_id: neighbor.building_id,
            category: neighbor.category,
        }
    }
}

/// Outages at one building and its neighbors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAddressDetail {
    /// The requested building.
    pub building_id: String,
    /// Day the detail was requested for.
    pub date: NaiveDate,
    /// Outages at the building.
    pub outages: Vec<ApiOutage>,
    /// Outages at nearby buildings.
    pub neighbors: Vec<ApiNeighbor>,
}

impl ApiAddressDetail {
    #[must_use]
    pub fn new(building_id: impl Into<String>, date: NaiveDate, info: AddressInfo) -> Self {
        Self {
            building_id: building_id.into(),
            date,
            outages: info.outages.into_iter().map(ApiOutage::from).collect(),
            neighbors: info.neighbors.into_iter().map(ApiNeighbor::from).collect(),
        }
    }
}

/// Query parameters for the suggestions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionQueryParams {
    /// Partial address as typed.
    #[serde(default)]
    pub input: String,
}

/// An address autocomplete candidate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSuggestion {
    pub street: String,
    pub building: String,
    pub building_id: String,
    /// `"<street>, д. <building>"`.
    pub label: String,
}

impl From<AddressSuggestion> for ApiSuggestion {
    fn from(suggestion: AddressSuggestion) -> Self {
        Self {
            label: suggestion.to_string(),
            street: suggestion.street,
            building: suggestion.building,
            building_id: suggestion.building_id,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
