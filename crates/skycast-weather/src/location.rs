//! One-shot location lookup.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::types::{Coordinates, LocationError};

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Something that can tell where the device is, once.
pub trait LocationProvider: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Coordinates taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// The user opted out of location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate location from the public IP address (ip-api.com compatible).
#[derive(Debug, Clone)]
pub struct IpLocation {
    client: Client,
    lookup_url: String,
}

impl IpLocation {
    pub fn new(lookup_url: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            lookup_url: lookup_url.into(),
        })
    }
}

impl LocationProvider for IpLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .client
            .get(&self.lookup_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    tracing::debug!("Location lookup request failed: {}", e);
                    LocationError::ServiceUnavailable
                }
            })?;

        if !response.status().is_success() {
            tracing::debug!("Location lookup returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("unreadable lookup response: {}", e)))?;

        if body.status != "success" {
            return Err(LocationError::Other(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => {
                tracing::info!("Located at {}, {}", latitude, longitude);
                Ok(Coordinates::new(latitude, longitude))
            }
            _ => Err(LocationError::Other("lookup response had no coordinates".into())),
        }
    }
}
