//! Decoding of `/api/weather` responses.
//!
//! The service answers with a JSON array of location records; the first one is
//! the match the view displays. Anything that does not fit that shape becomes
//! [`WeatherError::Malformed`] here instead of surfacing later as a missing field.

use chrono::Utc;
use serde::Deserialize;

use crate::types::{ForecastEntry, Measurement, WeatherError, WeatherReport, WeatherSnapshot};

#[derive(Debug, Deserialize)]
struct LocationRecord {
    district: String,
    state: String,
    weather: ApiWeather,
}

#[derive(Debug, Deserialize)]
struct ApiWeather {
    temperature: Measurement,
    condition: String,
    humidity: Measurement,
    wind_speed: Measurement,
    forecast: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    #[serde(rename = "_id")]
    id: String,
    day: String,
    condition: String,
    high: Measurement,
    low: Measurement,
}

impl From<ApiForecastDay> for ForecastEntry {
    fn from(day: ApiForecastDay) -> Self {
        Self {
            id: day.id,
            day: day.day,
            condition: day.condition,
            high: day.high,
            low: day.low,
        }
    }
}

impl LocationRecord {
    fn into_report(self) -> WeatherReport {
        let weather = self.weather;
        WeatherReport {
            snapshot: WeatherSnapshot {
                district: self.district,
                state: self.state,
                temperature: weather.temperature,
                condition: weather.condition,
                humidity: weather.humidity,
                wind_speed: weather.wind_speed,
            },
            forecast: weather.forecast.into_iter().map(ForecastEntry::from).collect(),
            fetched_at: Utc::now(),
        }
    }
}

/// Decode a response body into the report for its primary (first) record.
pub fn decode_report(body: &[u8]) -> Result<WeatherReport, WeatherError> {
    let records: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| WeatherError::Malformed(format!("expected a list of locations: {}", e)))?;

    let primary = records
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Malformed("response contained no locations".into()))?;

    // Only the primary record is validated; trailing records are never shown.
    let record: LocationRecord = serde_json::from_value(primary)
        .map_err(|e| WeatherError::Malformed(e.to_string()))?;

    Ok(record.into_report())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chennai() -> serde_json::Value {
        serde_json::json!([{
            "district": "Chennai",
            "state": "TN",
            "weather": {
                "temperature": 30,
                "condition": "Sunny",
                "humidity": 60,
                "wind_speed": 10,
                "forecast": [
                    {"_id": "1", "day": "Mon", "condition": "Sunny", "high": 32, "low": 24}
                ]
            }
        }])
    }

    #[test]
    fn test_decode_primary_record() {
        let body = serde_json::to_vec(&chennai()).unwrap();
        let report = decode_report(&body).unwrap();

        assert_eq!(report.snapshot.district, "Chennai");
        assert_eq!(report.snapshot.state, "TN");
        assert_eq!(report.snapshot.temperature, Measurement::Number(30.0));
        assert_eq!(report.forecast.len(), 1);
        assert_eq!(report.forecast[0].id, "1");
        assert_eq!(report.forecast[0].day, "Mon");
        assert_eq!(report.forecast[0].high.as_f64(), Some(32.0));
        assert_eq!(report.forecast[0].low.as_f64(), Some(24.0));
    }

    #[test]
    fn test_decode_takes_first_of_many() {
        let mut value = chennai();
        let mut second = value[0].clone();
        second["district"] = serde_json::json!("Madurai");
        value.as_array_mut().unwrap().push(second);

        let report = decode_report(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(report.snapshot.district, "Chennai");
    }

    #[test]
    fn test_decode_ignores_broken_trailing_records() {
        let mut value = chennai();
        value.as_array_mut().unwrap().push(serde_json::json!({"nope": true}));

        assert!(decode_report(&serde_json::to_vec(&value).unwrap()).is_ok());
    }

    #[test]
    fn test_decode_empty_forecast() {
        let mut value = chennai();
        value[0]["weather"]["forecast"] = serde_json::json!([]);

        let report = decode_report(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert!(report.forecast.is_empty());
    }

    #[test]
    fn test_decode_missing_forecast_is_malformed() {
        let mut value = chennai();
        value[0]["weather"].as_object_mut().unwrap().remove("forecast");

        let err = decode_report(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(ref m) if m.contains("forecast")));
    }

    #[test]
    fn test_decode_empty_array_is_malformed() {
        let err = decode_report(b"[]").unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(ref m) if m.contains("no locations")));
    }

    #[test]
    fn test_decode_missing_weather_is_malformed() {
        let err = decode_report(br#"[{"district": "X", "state": "Y"}]"#).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(ref m) if m.contains("weather")));
    }

    #[test]
    fn test_decode_object_instead_of_array_is_malformed() {
        let err = decode_report(br#"{"district": "X"}"#).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn test_decode_not_json_is_malformed() {
        let err = decode_report(b"<html>busy</html>").unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }
}
