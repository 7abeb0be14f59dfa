//! HTTP client for the district weather service.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::decode::decode_report;
use crate::types::{Coordinates, WeatherError, WeatherQuery, WeatherReport};

pub const DEFAULT_BASE_URL: &str = "https://weather-api-lssx.onrender.com";
const WEATHER_PATH: &str = "api/weather";
const USER_AGENT: &str = concat!("skycast/", env!("CARGO_PKG_VERSION"));

/// Source of weather reports. Implemented by [`WeatherClient`] and by test doubles.
pub trait WeatherApi: Send + Sync {
    /// Look up weather for an arbitrary query.
    fn fetch(
        &self,
        query: &WeatherQuery,
    ) -> impl Future<Output = Result<WeatherReport, WeatherError>> + Send;

    fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<WeatherReport, WeatherError>> + Send {
        async move { self.fetch(&WeatherQuery::Coordinates(coords)).await }
    }

    fn fetch_by_district(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<WeatherReport, WeatherError>> + Send {
        let query = WeatherQuery::District(name.to_string());
        async move { self.fetch(&query).await }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    endpoint: Url,
}

impl WeatherClient {
    /// Create a client for `base_url`. `timeout` of `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, WeatherError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: Self::endpoint_for(base_url)?,
        })
    }

    fn endpoint_for(base_url: &str) -> Result<Url, WeatherError> {
        // A base without a trailing slash would have its last segment replaced by join()
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Url::parse(&normalized)
            .and_then(|base| base.join(WEATHER_PATH))
            .map_err(|e| WeatherError::InvalidUrl(format!("{}: {}", base_url, e)))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl WeatherApi for WeatherClient {
    #[tracing::instrument(skip(self), fields(query = %query))]
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherReport, WeatherError> {
        tracing::debug!("Requesting weather");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Weather service returned status {}", status);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let report = decode_report(&body)?;

        tracing::info!(
            "Fetched weather for {}, {} ({} forecast days)",
            report.snapshot.district,
            report.snapshot.state,
            report.forecast.len()
        );
        Ok(report)
    }
}
