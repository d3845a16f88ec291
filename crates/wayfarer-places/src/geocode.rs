//! Forward geocoding: turn a typed query into candidate places.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use wayfarer_core::{NetworkError, ReqwestErrorExt, SearchConfig};

use crate::types::Location;

const USER_AGENT: &str = "Wayfarer/0.1.0";

/// Remote lookup consumed by the search layer. Implementations must not retry.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Find places matching `query`.
    ///
    /// # Errors
    /// Returns `NetworkError` when the lookup fails.
    async fn search(&self, query: &str) -> Result<Vec<Location>, NetworkError>;
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country_code: Option<String>,
    country: Option<String>,
    admin1: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(r: GeocodingResult) -> Self {
        Location {
            name: r.name,
            lat: r.latitude,
            lon: r.longitude,
            // Prefer the ISO code ("NG") over the long form ("Nigeria")
            country: r.country_code.or(r.country).unwrap_or_default(),
            state: r.admin1.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
    result_count: u32,
}

impl OpenMeteoGeocoder {
    /// Build a client for `base_url`.
    ///
    /// # Errors
    /// Returns `NetworkError` if the HTTP client can't be constructed.
    pub fn new(
        base_url: impl Into<String>,
        result_count: u32,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            result_count,
        })
    }

    /// Build a client from the `[search]` config section.
    ///
    /// # Errors
    /// Returns `NetworkError` if the HTTP client can't be constructed.
    pub fn from_config(config: &SearchConfig) -> Result<Self, NetworkError> {
        Self::new(
            config.geocoding_url.clone(),
            config.result_count,
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<Location>, NetworkError> {
        let url = format!("{}/v1/search", self.base_url);
        let count = self.result_count.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", query),
                ("count", count.as_str()),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!("Geocoding returned status {}", status);
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;

        let locations: Vec<Location> = body.results.into_iter().map(Location::from).collect();
        tracing::info!("Geocoded '{}' to {} candidates", query, locations.len());
        Ok(locations)
    }
}
