// 📡 Geolocation - single-shot position lookup behind the first user gesture

use crate::record::LatLng;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Position request options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position accepted; zero forces a fresh lookup
    pub maximum_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Advisory failures; each maps to one fixed user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Geolocation is not supported")]
    Unsupported,

    #[error("Access to geolocation was denied")]
    PermissionDenied,

    #[error("Location information is unavailable")]
    PositionUnavailable,

    #[error("Geolocation request timed out")]
    Timeout,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, options: &GeoOptions) -> Result<LatLng, GeoError>;
}

/// Run one position request, failing with `Timeout` after `options.timeout`
pub async fn locate(
    provider: &dyn LocationProvider,
    options: &GeoOptions,
) -> Result<LatLng, GeoError> {
    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(GeoError::Timeout),
    }
}

// ============================================================================
// PROVIDERS
// ============================================================================

/// No location source configured
pub struct Unsupported;

#[async_trait]
impl LocationProvider for Unsupported {
    async fn current_position(&self, _options: &GeoOptions) -> Result<LatLng, GeoError> {
        Err(GeoError::Unsupported)
    }
}

/// Position fixed by configuration
pub struct FixedLocation(pub LatLng);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self, _options: &GeoOptions) -> Result<LatLng, GeoError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
}

/// Lookup service returning `{ "latitude": .., "longitude": .. }`
pub struct HttpLocation {
    http: Client,
    url: String,
}

impl HttpLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LocationProvider for HttpLocation {
    async fn current_position(&self, options: &GeoOptions) -> Result<LatLng, GeoError> {
        let mut request = self.http.get(&self.url).timeout(options.timeout);
        if options.maximum_age.is_zero() {
            request = request.header("Cache-Control", "no-cache");
        }
        if options.enable_high_accuracy {
            request = request.query(&[("accuracy", "high")]);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %self.url, error = %e, "location lookup failed");
            if e.is_timeout() {
                GeoError::Timeout
            } else {
                GeoError::PositionUnavailable
            }
        })?;

        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                return Err(GeoError::PermissionDenied)
            }
            status if !status.is_success() => return Err(GeoError::PositionUnavailable),
            _ => {}
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|_| GeoError::PositionUnavailable)?;

        Ok(LatLng::new(body.latitude, body.longitude))
    }
}
