use crate::services::weather_service::WeatherError as UiWeatherError;
use skycast_core::{AppError, WeatherError};

impl From<UiWeatherError> for AppError {
    fn from(e: UiWeatherError) -> Self {
        match e {
            UiWeatherError::Network(e) => AppError::from(e),
            UiWeatherError::Location(e) => AppError::from(e),
            UiWeatherError::Interrupted | UiWeatherError::NotInitialized => {
                AppError::Weather(WeatherError::ServiceUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::{LocationError, WeatherError as LookupError};

    #[test]
    fn status_keeps_its_code() {
        let err: AppError = UiWeatherError::Network(LookupError::Status(404)).into();
        assert!(matches!(err, AppError::Weather(WeatherError::FetchFailed(404))));
    }

    #[test]
    fn location_failure_is_denied() {
        let err: AppError = UiWeatherError::Location(LocationError::Timeout).into();
        assert!(matches!(err, AppError::Weather(WeatherError::LocationDenied(_))));
    }

    #[test]
    fn interrupted_is_unavailable() {
        let err: AppError = UiWeatherError::Interrupted.into();
        assert!(matches!(
            err,
            AppError::Weather(WeatherError::ServiceUnavailable)
        ));
        assert!(!err.user_message().is_empty());
    }
}
