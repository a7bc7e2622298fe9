#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gateway to the outage backend.
//!
//! [`OutageGateway`] is the seam the store depends on: four request /
//! response operations with no retry and no caching. [`http::HttpGateway`]
//! is the `reqwest` implementation used in production; tests substitute
//! in-memory implementations.
//!
//! An empty result is always `Ok(vec![])`. Transport failures, non-success
//! statuses and undecodable bodies are distinct [`GatewayError`] variants
//! so callers never confuse "no outages today" with "backend down".

pub mod config;
pub mod http;

use async_trait::async_trait;
use blackout_map_outage_models::{AddressInfo, AddressSuggestion, District, OutageRecord};
use chrono::NaiveDateTime;
use thiserror::Error;

pub use config::{ConfigError, GatewayConfig};
pub use http::HttpGateway;

/// Errors from gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be sent or the response not received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Operations the outage backend offers.
#[async_trait]
pub trait OutageGateway: Send + Sync {
    /// Outages active as of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport, status or decode failure.
    async fn fetch_outages(&self, as_of: NaiveDateTime) -> Result<Vec<OutageRecord>, GatewayError>;

    /// Address candidates for a partial input.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport, status or decode failure.
    async fn fetch_address_suggestions(
        &self,
        input: &str,
    ) -> Result<Vec<AddressSuggestion>, GatewayError>;

    /// The district reference list.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport, status or decode failure.
    async fn fetch_districts(&self) -> Result<Vec<District>, GatewayError>;

    /// Outages at one building and its neighbors as of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport, status or decode failure.
    async fn fetch_address_info(
        &self,
        building_id: &str,
        as_of: NaiveDateTime,
        limit_neighbors: u32,
    ) -> Result<AddressInfo, GatewayError>;
}
