//! `reqwest` implementation of [`OutageGateway`].

use async_trait::async_trait;
use blackout_map_outage_models::{
    AddressInfo, AddressSuggestion, District, OutageRecord, timestamp,
};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;

use crate::{GatewayConfig, GatewayError, OutageGateway};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Talks to the outage backend over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the TLS backend fails to
    /// initialize.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("blackout-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// The configuration this gateway was built with.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.config.url(path);
        log::debug!("GET {url} {query:?}");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .inspect_err(|e| log::warn!("Request to {url} failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            log::warn!("Backend returned {status} for {url}");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|source| {
            let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
            log::warn!("Undecodable response from {url}: {source}\n  body preview: {preview}");
            GatewayError::Decode { url, source }
        })
    }
}

#[async_trait]
impl OutageGateway for HttpGateway {
    async fn fetch_outages(&self, as_of: NaiveDateTime) -> Result<Vec<OutageRecord>, GatewayError> {
        let outages: Vec<OutageRecord> = self
            .get_json(
                &self.config.endpoints.outages,
                &[("date", timestamp::format(as_of))],
            )
            .await?;
        log::info!("Fetched {} outage(s) as of {as_of}", outages.len());
        Ok(outages)
    }

    async fn fetch_address_suggestions(
        &self,
        input: &str,
    ) -> Result<Vec<AddressSuggestion>, GatewayError> {
        let mut suggestions: Vec<AddressSuggestion> = self
            .get_json(
                &self.config.endpoints.suggestions,
                &[("input", input.to_string())],
            )
            .await?;
        suggestions.truncate(self.config.suggestion_limit);
        Ok(suggestions)
    }

    async fn fetch_districts(&self) -> Result<Vec<District>, GatewayError> {
        self.get_json(&self.config.endpoints.districts, &[]).await
    }

    async fn fetch_address_info(
        &self,
        building_id: &str,
        as_of: NaiveDateTime,
        limit_neighbors: u32,
    ) -> Result<AddressInfo, GatewayError> {
        self.get_json(
            &self.config.endpoints.address_info,
            &[
                ("building_id", building_id.to_string()),
                ("date", timestamp::format(as_of)),
                ("limit_neighbors", limit_neighbors.to_string()),
            ],
        )
        .await
    }
}
