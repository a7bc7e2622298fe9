#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map integration for outage markers.
//!
//! The store and views only talk to a map through [`MarkerRenderer`]. The
//! bundled implementation, [`GeoJsonRenderer`], turns outages into a
//! GeoJSON `FeatureCollection` that any web map (`MapLibre`, Leaflet) can
//! draw as a point layer, plus the bounding box to fit the viewport to.

use std::collections::BTreeSet;

use blackout_map_outage_models::{OutageRecord, format_duration, timestamp};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};
use serde::Serialize;

/// A geographic extent in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Smallest box containing every outage location, or `None` for an
    /// empty slice.
    #[must_use]
    pub fn around(outages: &[OutageRecord]) -> Option<Self> {
        let mut iter = outages.iter().map(|o| o.coordinates);
        let first = iter.next()?;
        let init = Self {
            west: first.longitude,
            south: first.latitude,
            east: first.longitude,
            north: first.latitude,
        };
        Some(iter.fold(init, |b, c| Self {
            west: b.west.min(c.longitude),
            south: b.south.min(c.latitude),
            east: b.east.max(c.longitude),
            north: b.north.max(c.latitude),
        }))
    }

    /// `[west, south, east, north]`, the GeoJSON `bbox` order.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    #[must_use]
    pub fn center(self) -> (f64, f64) {
        (
            f64::midpoint(self.south, self.north),
            f64::midpoint(self.west, self.east),
        )
    }

    #[must_use]
    pub fn contains(self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude)
            && (self.west..=self.east).contains(&longitude)
    }
}

/// The narrow interface a map widget offers the rest of the system.
pub trait MarkerRenderer {
    /// Replaces every marker with one per outage.
    fn render_markers(&mut self, outages: &[OutageRecord]);

    /// Moves the viewport to show every given outage. An empty slice leaves
    /// the viewport alone.
    fn fit_bounds(&mut self, outages: &[OutageRecord]);

    /// Resolves a clicked marker to the outage id it stands for, or `None`
    /// if no such marker is currently rendered.
    fn on_marker_click(&self, marker_id: &str) -> Option<String>;
}

/// A rendered marker layer, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct MapLayer {
    pub markers: FeatureCollection,
    /// `[west, south, east, north]`, absent when there is nothing to fit.
    pub bounds: Option<[f64; 4]>,
}

/// [`MarkerRenderer`] producing GeoJSON.
#[derive(Debug, Default)]
pub struct GeoJsonRenderer {
    features: Vec<Feature>,
    ids: BTreeSet<String>,
    bounds: Option<BoundingBox>,
}

impl GeoJsonRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `outages` and fits the viewport to them in one go.
    #[must_use]
    pub fn layer_for(outages: &[OutageRecord]) -> MapLayer {
        let mut renderer = Self::new();
        renderer.render_markers(outages);
        renderer.fit_bounds(outages);
        renderer.into_layer()
    }

    /// The viewport most recently fitted.
    #[must_use]
    pub const fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn into_layer(self) -> MapLayer {
        let bounds = self.bounds.map(BoundingBox::to_array);
        MapLayer {
            markers: FeatureCollection {
                bbox: bounds.map(Vec::from),
                features: self.features,
                foreign_members: None,
            },
            bounds,
        }
    }
}

impl MarkerRenderer for GeoJsonRenderer {
    fn render_markers(&mut self, outages: &[OutageRecord]) {
        self.features = outages.iter().map(outage_feature).collect();
        self.ids = outages.iter().map(|o| o.id.clone()).collect();
        log::debug!("Rendered {} marker(s)", self.features.len());
    }

    fn fit_bounds(&mut self, outages: &[OutageRecord]) {
        if let Some(bounds) = BoundingBox::around(outages) {
            self.bounds = Some(bounds);
        }
    }

    fn on_marker_click(&self, marker_id: &str) -> Option<String> {
        self.ids.get(marker_id).cloned()
    }
}

fn outage_feature(outage: &OutageRecord) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".into(), outage.id.clone().into());
    properties.insert("category".into(), outage.category.to_string().into());
    properties.insert("label".into(), outage.category.label().into());
    properties.insert("color".into(), outage.category.color().into());
    properties.insert("address".into(), outage.address_line().into());
    properties.insert("description".into(), outage.description.clone().into());
    properties.insert("start".into(), timestamp::format(outage.start_date).into());
    properties.insert("end".into(), timestamp::format(outage.end_date).into());
    properties.insert(
        "duration".into(),
        format_duration(outage.duration()).into(),
    );
    if let Some(building_id) = &outage.building_id {
        properties.insert("building_id".into(), building_id.clone().into());
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            outage.coordinates.longitude,
            outage.coordinates.latitude,
        ]))),
        id: Some(Id::String(outage.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}
