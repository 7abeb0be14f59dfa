use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure text for a non-success status on the coordinate lookup.
pub const COORDINATES_FAILURE: &str = "Failed to fetch weather data";

/// Failure text for a non-success status on the district lookup.
pub const DISTRICT_FAILURE: &str = "District not found";

/// Geographic position reported by a location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A reading exactly as the API sent it.
///
/// The service is not strict about units: most readings arrive as numbers,
/// some deployments send preformatted text such as `"12 km/h"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Number(f64),
    Text(String),
}

impl Measurement {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display already drops a trailing ".0"
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Current conditions for one district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub district: String,
    pub state: String,
    pub temperature: Measurement,
    pub condition: String,
    pub humidity: Measurement,
    pub wind_speed: Measurement,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub id: String,
    pub day: String,
    pub condition: String,
    pub high: Measurement,
    pub low: Measurement,
}

/// Everything one successful lookup produces. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub forecast: Vec<ForecastEntry>,
    pub fetched_at: DateTime<Utc>,
}

/// What to look weather up by
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Coordinates(Coordinates),
    District(String),
}

impl WeatherQuery {
    /// Builds a district query, or `None` when the name is blank.
    pub fn district(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if name.is_empty() {
            None
        } else {
            Some(Self::District(name.to_string()))
        }
    }

    /// Message shown when the service answers with a non-success status.
    pub fn failure_text(&self) -> &'static str {
        match self {
            Self::Coordinates(_) => COORDINATES_FAILURE,
            Self::District(_) => DISTRICT_FAILURE,
        }
    }

    /// Query-string pairs for `GET /api/weather`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            Self::District(name) => vec![("district", name.clone())],
        }
    }
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates(c) => write!(f, "coordinates {}", c),
            Self::District(name) => write!(f, "district {}", name),
        }
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The service answered with a non-success status.
    #[error("Weather service returned status {0}")]
    Status(u16),
    /// Transport-level failure; the message is shown to the user verbatim.
    #[error("{0}")]
    Network(#[from] reqwest::Error),
    /// The body did not have the expected shape.
    #[error("Malformed weather response: {0}")]
    Malformed(String),
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

impl WeatherError {
    /// Text for the error line, given the lookup that failed.
    pub fn display_message(&self, query: &WeatherQuery) -> String {
        match self {
            Self::Status(_) => query.failure_text().to_string(),
            other => other.to_string(),
        }
    }
}
