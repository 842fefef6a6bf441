//! Postcode geocoding.
//!
//! [`Geocoder`] is the seam the proximity search depends on. The production
//! implementation, [`NominatimGeocoder`], resolves free text through the
//! [Nominatim](https://nominatim.openstreetmap.org) search API.
//!
//! A lookup that finds nothing is `Ok(None)`; only transport and provider
//! failures are errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::distance::Coordinates;
use crate::postcode::is_valid_postcode;

/// Configuration for the Nominatim geocoding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Base URL for the Nominatim API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Fixed client identifier sent as the `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Comma separated ISO country codes passed as `countrycodes`; empty disables the filter.
    #[serde(default = "default_country_codes")]
    pub country_codes: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub(crate) fn default_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

pub(crate) fn default_user_agent() -> String {
    "social-charger-club-app".to_string()
}

pub(crate) fn default_country_codes() -> String {
    "gb".to_string()
}

pub(crate) const fn default_timeout_secs() -> u64 {
    5
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            country_codes: default_country_codes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Errors raised while talking to a geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// The HTTP client could not be built or the connection failed.
    #[error("geocoding connection failed: {0}")]
    ConnectionFailed(String),

    /// The provider answered with a non-success status.
    #[error("geocoding request failed: {0}")]
    RequestFailed(String),

    /// The provider's response could not be interpreted.
    #[error("geocoding parse error: {0}")]
    ParseError(String),

    /// The request exceeded the configured timeout.
    #[error("geocoding request timed out")]
    Timeout,
}

/// Resolves free text to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `query`. Returns `Ok(None)` when the provider has no match.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodingError>;
}

/// Geocode a postcode, rejecting malformed input before any provider call.
///
/// Returns `Ok(None)` for an empty or malformed postcode and for postcodes the
/// provider cannot resolve.
pub async fn geocode_postcode(
    geocoder: &dyn Geocoder,
    postcode: &str,
) -> Result<Option<Coordinates>, GeocodingError> {
    if postcode.is_empty() || !is_valid_postcode(postcode) {
        debug!(%postcode, "postcode rejected before geocoding");
        return Ok(None);
    }
    geocoder.geocode(postcode).await
}

/// Nominatim-backed [`Geocoder`].
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    config: NominatimConfig,
}

impl NominatimGeocoder {
    /// Build a client for `config`.
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &NominatimConfig {
        &self.config
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodingError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let mut params = vec![
            ("q", query.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", "1".to_string()),
        ];
        if !self.config.country_codes.is_empty() {
            params.push(("countrycodes", self.config.country_codes.clone()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Timeout
                } else {
                    GeocodingError::ConnectionFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeocodingError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        let Some(result) = results.first() else {
            debug!(%query, "no geocoding match");
            return Ok(None);
        };

        let latitude: f64 = result
            .lat
            .parse()
            .map_err(|_| GeocodingError::ParseError(format!("invalid latitude '{}'", result.lat)))?;
        let longitude: f64 = result
            .lon
            .parse()
            .map_err(|_| GeocodingError::ParseError(format!("invalid longitude '{}'", result.lon)))?;

        let coordinates = Coordinates::new(latitude, longitude);
        if !coordinates.is_valid() {
            return Err(GeocodingError::ParseError(format!(
                "coordinates out of range: {coordinates}"
            )));
        }

        debug!(%query, %latitude, %longitude, "geocoded");
        Ok(Some(coordinates))
    }
}

/// Raw Nominatim search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}
