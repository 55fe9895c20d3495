//! Nominatim geocoding backend.
//!
//! Issues one structured search per lookup
//! (`/search?street=..&city=..&state=..&country=..&postalcode=..&format=json&limit=1`)
//! and takes the first result. An empty result set is not an error: the
//! address resolves to [`Coordinates::FALLBACK`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use realty_core::defaults::{
    ENV_GEOCODER_BASE_URL, ENV_GEOCODER_TIMEOUT_SECS, ENV_GEOCODER_USER_AGENT, GEOCODER_BASE_URL,
    GEOCODER_TIMEOUT_SECS, GEOCODER_USER_AGENT,
};
use realty_core::{Address, Coordinates, Error, Geocoder, Result};

/// Configuration for the Nominatim backend.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    /// Identifying `User-Agent`; the public service rejects anonymous clients.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: GEOCODER_BASE_URL.to_string(),
            user_agent: GEOCODER_USER_AGENT.to_string(),
            timeout_secs: GEOCODER_TIMEOUT_SECS,
        }
    }
}

impl NominatimConfig {
    /// Read `GEOCODER_BASE_URL`, `GEOCODER_USER_AGENT` and
    /// `GEOCODER_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var(ENV_GEOCODER_BASE_URL)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            user_agent: std::env::var(ENV_GEOCODER_USER_AGENT).unwrap_or(defaults.user_agent),
            timeout_secs: std::env::var(ENV_GEOCODER_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Nominatim-compatible geocoder.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create geocoder client: {}", e)))?;

        info!(
            subsystem = "geocode",
            component = "nominatim",
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "Initializing Nominatim geocoder"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(NominatimConfig::from_env())
    }
}

/// Coordinates of the first result, or the fallback when there is no usable
/// result.
pub fn first_result_coordinates(results: &[Value]) -> Coordinates {
    let Some(first) = results.first() else {
        return Coordinates::FALLBACK;
    };
    match (number_field(first, "lon"), number_field(first, "lat")) {
        (Some(lon), Some(lat)) => Coordinates::new(lon, lat),
        _ => Coordinates::FALLBACK,
    }
}

// Nominatim returns coordinates as strings; accept plain numbers too.
fn number_field(value: &Value, key: &str) -> Option<f64> {
    let n = match value.get(key)? {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &Address) -> Result<Coordinates> {
        let start = Instant::now();

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("street", address.address.as_str()),
                ("city", address.city.as_str()),
                ("state", address.state.as_str()),
                ("country", address.country.as_str()),
                ("postalcode", address.postal_code.as_str()),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Geocoding(format!(
                "Geocoder returned {}: {}",
                status, body
            )));
        }

        let results: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to parse response: {}", e)))?;

        let coordinates = first_result_coordinates(&results);
        let elapsed = start.elapsed().as_millis() as u64;
        if coordinates == Coordinates::FALLBACK {
            warn!(
                subsystem = "geocode",
                component = "nominatim",
                city = %address.city,
                postal_code = %address.postal_code,
                duration_ms = elapsed,
                "No geocoding result, using fallback coordinates"
            );
        } else {
            debug!(
                subsystem = "geocode",
                component = "nominatim",
                longitude = coordinates.longitude,
                latitude = coordinates.latitude,
                duration_ms = elapsed,
                "Geocoding complete"
            );
        }
        Ok(coordinates)
    }

    fn name(&self) -> &str {
        "nominatim"
    }
}
