#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Outage record, category taxonomy and filter selection types.
//!
//! This crate defines the shapes shared across the whole blackout-map
//! system: the records returned by the outage backend, the reduced
//! neighbor projection used by the address detail view, the district
//! reference list, and the [`FilterSelection`] the store holds.
//!
//! Wire quirks of the backend are absorbed here at deserialization time
//! (numeric building numbers, space-separated timestamps, the
//! `coordinate`/`coordinates` spelling) so downstream crates only ever see
//! normalized values.

pub mod timestamp;

use std::convert::Infallible;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Utility category of an outage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutageCategory {
    /// Hot water supply interruption
    HotWater,
    /// Cold water supply interruption
    ColdWater,
    /// Electricity interruption
    Electricity,
    /// Central heating interruption
    Heat,
    /// A category value the backend sent that this build does not know
    #[default]
    Unknown,
}

impl OutageCategory {
    /// Returns all known categories in display order.
    ///
    /// [`Self::Unknown`] is intentionally absent: it only exists to absorb
    /// unexpected wire values.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::HotWater, Self::ColdWater, Self::Electricity, Self::Heat]
    }

    /// Human-readable (Russian) label shown in lists and on markers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HotWater => "Горячая вода",
            Self::ColdWater => "Холодная вода",
            Self::Electricity => "Электричество",
            Self::Heat => "Отопление",
            Self::Unknown => "Неизвестно",
        }
    }

    /// Marker colour as a CSS hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::HotWater => "#ff6b6b",
            Self::ColdWater => "#4dabf7",
            Self::Electricity => "#ffd43b",
            Self::Heat => "#ff8787",
            Self::Unknown => "#adb5bd",
        }
    }
}

impl<'de> Deserialize<'de> for OutageCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(Self::Unknown))
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// One reported utility interruption at a specific building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutageRecord {
    /// Backend identifier.
    pub id: String,
    /// When the outage started.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_date: NaiveDateTime,
    /// When the outage is scheduled to end.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_date: NaiveDateTime,
    /// Free-text description from the utility.
    #[serde(default)]
    pub description: String,
    /// Utility category.
    #[serde(rename = "type")]
    pub category: OutageCategory,
    /// Backend building identifier, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    /// Building number as text (`"118А"`, `"33"`).
    #[serde(deserialize_with = "deserialize_building_number")]
    pub building_number: String,
    /// Street name.
    pub street: String,
    /// Administrative district.
    pub district: String,
    /// Colloquial ("folk") district name.
    #[serde(default)]
    pub folk_district: String,
    /// Larger colloquial district grouping.
    #[serde(default)]
    pub big_folk_district: String,
    /// City.
    pub city: String,
    /// Building location.
    #[serde(alias = "coordinate")]
    pub coordinates: Coordinate,
    /// Model-predicted end, only present in address detail responses.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize_option"
    )]
    pub predicted_end_date: Option<NaiveDateTime>,
}

impl OutageRecord {
    /// The three district naming schemes, in administrative → colloquial
    /// order.
    #[must_use]
    pub fn district_names(&self) -> [&str; 3] {
        [&self.district, &self.folk_district, &self.big_folk_district]
    }

    /// Every field the free-text search looks at.
    #[must_use]
    pub fn searchable_fields(&self) -> [&str; 7] {
        [
            &self.description,
            &self.street,
            &self.district,
            &self.folk_district,
            &self.big_folk_district,
            &self.city,
            &self.building_number,
        ]
    }

    /// `"<city>, <street>, д. <building>"`
    #[must_use]
    pub fn address_line(&self) -> String {
        format!(
            "{}, {}, д. {}",
            self.city, self.street, self.building_number
        )
    }

    /// Scheduled duration. Negative spans (bad data) clamp to zero.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        (self.end_date - self.start_date).max(TimeDelta::zero())
    }
}

/// Formats a duration as `"<d> дн. <h> ч."`, or `"<h> ч."` when shorter
/// than a day. Hours are floored.
#[must_use]
pub fn format_duration(duration: TimeDelta) -> String {
    let hours = duration.num_hours();
    let days = hours / 24;
    if days > 0 {
        format!("{days} дн. {} ч.", hours % 24)
    } else {
        format!("{hours} ч.")
    }
}

/// A nearby building with an active outage, as listed on the address
/// detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborOutage {
    /// Street name.
    pub street: String,
    /// Building number as text.
    #[serde(alias = "building_number", deserialize_with = "deserialize_building_number")]
    pub building: String,
    /// Backend building identifier, used to link to its own detail view.
    #[serde(default)]
    pub building_id: String,
    /// Utility category.
    #[serde(rename = "type", default)]
    pub category: OutageCategory,
}

/// Outages for one building plus outages at its neighbors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// Outages at the requested building (with predicted end).
    #[serde(rename = "blackouts", default)]
    pub outages: Vec<OutageRecord>,
    /// Outages at surrounding buildings.
    #[serde(
        rename = "neighbor_blackouts",
        alias = "neighbor_addresses",
        default
    )]
    pub neighbors: Vec<NeighborOutage>,
}

impl AddressInfo {
    /// Whether neither the building nor its neighbors have outages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outages.is_empty() && self.neighbors.is_empty()
    }
}

/// An autocomplete candidate returned for a partial address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    /// Street name.
    pub street: String,
    /// Building number as text.
    #[serde(deserialize_with = "deserialize_building_number")]
    pub building: String,
    /// Backend building identifier.
    pub building_id: String,
}

impl std::fmt::Display for AddressSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, д. {}", self.street, self.building)
    }
}

/// A district name from the reference list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct District {
    /// Administrative, folk or big folk district name.
    pub name: String,
}

/// The category part of a [`FilterSelection`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No category restriction.
    #[default]
    All,
    /// Exactly this category.
    Only(OutageCategory),
    /// A value that names no known category. Matches nothing.
    Unrecognized(String),
}

impl CategoryFilter {
    /// Whether this filter places no restriction on category.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            return Ok(Self::All);
        }
        Ok(match s.parse::<OutageCategory>() {
            Ok(category) if category != OutageCategory::Unknown => Self::Only(category),
            _ => Self::Unrecognized(s.to_string()),
        })
    }
}

impl From<OutageCategory> for CategoryFilter {
    fn from(category: OutageCategory) -> Self {
        Self::Only(category)
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => write!(f, "{category}"),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// The user's current filter choices.
///
/// Category, districts and query are refined locally; the date selects
/// which day's snapshot is fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    /// Category restriction.
    pub category: CategoryFilter,
    /// District names; empty means no district restriction.
    pub districts: Vec<String>,
    /// Free-text query as typed.
    pub query: String,
    /// Selected calendar day.
    pub date: NaiveDate,
}

impl FilterSelection {
    /// A selection with no restrictions for the given day.
    #[must_use]
    pub const fn for_date(date: NaiveDate) -> Self {
        Self {
            category: CategoryFilter::All,
            districts: Vec::new(),
            query: String::new(),
            date,
        }
    }

    /// Whether any of category, districts or query restricts the view.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.category.is_all() || !self.districts.is_empty() || !self.query.trim().is_empty()
    }

    /// Resets category, districts and query, keeping the date.
    pub fn clear(&mut self) {
        self.category = CategoryFilter::All;
        self.districts.clear();
        self.query.clear();
    }
}

/// Accepts a building number sent either as a string or as an integer.
fn deserialize_building_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json() -> serde_json::Value {
        serde_json::json!({
            "id": "5",
            "start_date": "2018-01-06 00:08:00",
            "end_date": "2018-01-07 12:00:00",
            "description": "Техническое обслуживание системы горячего водоснабжения",
            "type": "hot_water",
            "building_number": 33,
            "street": "Русская",
            "district": "Фрунзенский",
            "folk_district": "Русская",
            "big_folk_district": "Фрунзенский",
            "city": "Владивосток",
            "coordinate": {
                "latitude": 43.178_232,
                "longitude": 131.917_838
            }
        })
    }

    #[test]
    fn numeric_building_number_becomes_text() {
        let record: OutageRecord = serde_json::from_value(record_json()).unwrap();
        assert_eq!(record.building_number, "33");
        assert_eq!(record.category, OutageCategory::HotWater);
        assert!(record.predicted_end_date.is_none());
    }

    #[test]
    fn unknown_category_does_not_fail_record() {
        let mut json = record_json();
        json["type"] = serde_json::json!("gas");
        let record: OutageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.category, OutageCategory::Unknown);
    }

    #[test]
    fn duration_formats_days_and_hours() {
        let record: OutageRecord = serde_json::from_value(record_json()).unwrap();
        assert_eq!(format_duration(record.duration()), "1 дн. 11 ч.");
        assert_eq!(format_duration(TimeDelta::minutes(150)), "2 ч.");
    }

    #[test]
    fn address_line_uses_building_marker() {
        let record: OutageRecord = serde_json::from_value(record_json()).unwrap();
        assert_eq!(record.address_line(), "Владивосток, Русская, д. 33");
    }

    #[test]
    fn address_info_accepts_neighbor_addresses_alias() {
        let info: AddressInfo = serde_json::from_value(serde_json::json!({
            "blackouts": [],
            "neighbor_addresses": [
                { "street": "Светланская ул.", "building": "118А", "building_id": "b428" }
            ]
        }))
        .unwrap();
        assert_eq!(info.neighbors.len(), 1);
        assert_eq!(info.neighbors[0].category, OutageCategory::Unknown);
        assert!(!info.is_empty());
    }

    #[test]
    fn category_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "heat".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(OutageCategory::Heat)
        );
        assert_eq!(
            "Heat".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Unrecognized("Heat".to_string())
        );
        assert_eq!(
            "unknown".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Unrecognized("unknown".to_string())
        );
    }

    #[test]
    fn clear_keeps_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut selection = FilterSelection::for_date(date);
        selection.category = OutageCategory::Heat.into();
        selection.districts.push("Ленинский".to_string());
        selection.query = "ремонт".to_string();
        assert!(selection.has_active_filters());

        selection.clear();
        assert!(!selection.has_active_filters());
        assert_eq!(selection.date, date);
    }
}
