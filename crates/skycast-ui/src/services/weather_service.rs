//! Weather backend: async lookups.
//! All network work runs on spawned tasks; results come back via mpsc.

use std::sync::Arc;

use skycast_core::LOCATION_DENIED;
use skycast_weather::{
    Coordinates, LocationError, LocationProvider, WeatherApi, WeatherError as LookupError,
    WeatherQuery, WeatherReport,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::models::weather_model::Ticket;

/// Error type for weather operations
#[derive(Debug)]
pub enum WeatherError {
    Network(LookupError),
    Location(LocationError),
    /// The task ended (shutdown or panic) before it reported a result
    Interrupted,
    NotInitialized,
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Transport text is shown to the user as-is
            WeatherError::Network(e) => write!(f, "{}", e),
            WeatherError::Location(e) => write!(f, "Location error: {}", e),
            WeatherError::Interrupted => write!(f, "Weather request was interrupted"),
            WeatherError::NotInitialized => write!(f, "Weather service not initialized"),
        }
    }
}

impl std::error::Error for WeatherError {}

impl WeatherError {
    /// Text for the error line, given the lookup that failed.
    pub fn display_message(&self, query: &WeatherQuery) -> String {
        match self {
            WeatherError::Network(e) => e.display_message(query),
            WeatherError::Location(_) => LOCATION_DENIED.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<LookupError> for WeatherError {
    fn from(e: LookupError) -> Self {
        WeatherError::Network(e)
    }
}

impl From<LocationError> for WeatherError {
    fn from(e: LocationError) -> Self {
        WeatherError::Location(e)
    }
}

/// Messages sent from async operations back to the event loop
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// A lookup settled
    FetchDone {
        ticket: Ticket,
        result: Result<WeatherReport, WeatherError>,
    },
    /// The one-shot location request settled
    LocationDone(Result<Coordinates, WeatherError>),
}

/// Sends `FetchDone` exactly once, even if the task is dropped before finishing.
struct FetchReporter {
    tx: UnboundedSender<WeatherServiceMessage>,
    ticket: Option<Ticket>,
}

impl FetchReporter {
    fn finish(mut self, result: Result<WeatherReport, WeatherError>) {
        if let Some(ticket) = self.ticket.take() {
            let _ = self.tx.send(WeatherServiceMessage::FetchDone { ticket, result });
        }
    }
}

impl Drop for FetchReporter {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            tracing::debug!(
                "Lookup for {} ended without a result",
                ticket.query()
            );
            let _ = self.tx.send(WeatherServiceMessage::FetchDone {
                ticket,
                result: Err(WeatherError::Interrupted),
            });
        }
    }
}

/// Request a weather lookup asynchronously.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch<A>(
    tx: &UnboundedSender<WeatherServiceMessage>,
    api: Arc<A>,
    ticket: Ticket,
    cancel: &CancellationToken,
) where
    A: WeatherApi + 'static,
{
    let tx = tx.clone();
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(r) => r,
        Err(_) => {
            let _ = tx.send(WeatherServiceMessage::FetchDone {
                ticket,
                result: Err(WeatherError::NotInitialized),
            });
            return;
        }
    };

    let cancel = cancel.clone();
    let query = ticket.query().clone();

    runtime.spawn(async move {
        let reporter = FetchReporter {
            tx,
            ticket: Some(ticket),
        };

        let result = tokio::select! {
            // Dropping the reporter reports the interruption
            _ = cancel.cancelled() => return,
            result = api.fetch(&query) => result.map_err(WeatherError::from),
        };

        reporter.finish(result);
    });
}

/// Request the device location asynchronously.
/// Sends `LocationDone` on the channel when complete.
pub fn request_location<P>(
    tx: &UnboundedSender<WeatherServiceMessage>,
    provider: Arc<P>,
    cancel: &CancellationToken,
) where
    P: LocationProvider + 'static,
{
    let tx = tx.clone();
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(r) => r,
        Err(_) => {
            let _ = tx.send(WeatherServiceMessage::LocationDone(Err(
                WeatherError::NotInitialized,
            )));
            return;
        }
    };

    let cancel = cancel.clone();

    runtime.spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = provider.locate() => result,
        };

        match &result {
            Ok(coords) => tracing::info!("Got location: {}", coords),
            Err(e) => tracing::warn!("Location unavailable: {}", e),
        }

        let _ = tx.send(WeatherServiceMessage::LocationDone(
            result.map_err(WeatherError::from),
        ));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skycast_core::RacePolicy;
    use skycast_weather::{DeniedLocation, FixedLocation, Measurement, WeatherSnapshot};
    use tokio::sync::mpsc;

    use crate::models::weather_model::WeatherViewController;

    fn report() -> WeatherReport {
        WeatherReport {
            snapshot: WeatherSnapshot {
                district: "Chennai".into(),
                state: "Tamil Nadu".into(),
                temperature: Measurement::Number(31.0),
                condition: "Sunny".into(),
                humidity: Measurement::Number(70.0),
                wind_speed: Measurement::Number(12.0),
            },
            forecast: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    struct InstantApi;

    impl WeatherApi for InstantApi {
        async fn fetch(&self, _query: &WeatherQuery) -> Result<WeatherReport, LookupError> {
            Ok(report())
        }
    }

    struct NeverApi;

    impl WeatherApi for NeverApi {
        async fn fetch(&self, _query: &WeatherQuery) -> Result<WeatherReport, LookupError> {
            std::future::pending().await
        }
    }

    struct PanickingApi;

    impl WeatherApi for PanickingApi {
        #[allow(clippy::panic)]
        async fn fetch(&self, _query: &WeatherQuery) -> Result<WeatherReport, LookupError> {
            panic!("lookup blew up")
        }
    }

    fn ticket_for<A: WeatherApi>(api: Arc<A>) -> Ticket {
        let mut controller = WeatherViewController::new(api, RacePolicy::LatestRequest);
        controller.begin(WeatherQuery::District("Chennai".into()))
    }

    #[test]
    fn weather_error_display() {
        assert!(format!("{}", WeatherError::Location(LocationError::Timeout)).contains("Location"));
        assert!(format!("{}", WeatherError::NotInitialized).contains("not initialized"));
        assert!(format!("{}", WeatherError::Interrupted).contains("interrupted"));
    }

    #[test]
    fn status_uses_flow_text() {
        let query = WeatherQuery::District("Nowhere".into());
        let err = WeatherError::Network(LookupError::Status(404));
        assert_eq!(err.display_message(&query), "District not found");
    }

    #[test]
    fn location_failure_reads_as_denied() {
        let query = WeatherQuery::District("x".into());
        let err = WeatherError::Location(LocationError::ServiceUnavailable);
        assert_eq!(err.display_message(&query), "Location access denied.");
    }

    #[test]
    fn fetch_without_runtime_reports_not_initialized() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticket = ticket_for(Arc::new(InstantApi));

        request_fetch(&tx, Arc::new(InstantApi), ticket, &CancellationToken::new());

        match rx.try_recv() {
            Ok(WeatherServiceMessage::FetchDone { result, .. }) => {
                assert!(matches!(result, Err(WeatherError::NotInitialized)));
            }
            other => unreachable!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_reports_result() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticket = ticket_for(Arc::new(InstantApi));
        let generation = ticket.generation();

        request_fetch(&tx, Arc::new(InstantApi), ticket, &CancellationToken::new());

        match rx.recv().await {
            Some(WeatherServiceMessage::FetchDone { ticket, result }) => {
                assert_eq!(ticket.generation(), generation);
                assert_eq!(result.unwrap().snapshot.district, "Chennai");
            }
            other => unreachable!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancelled_fetch_reports_interrupted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let ticket = ticket_for(Arc::new(NeverApi));

        request_fetch(&tx, Arc::new(NeverApi), ticket, &cancel);
        cancel.cancel();

        match rx.recv().await {
            Some(WeatherServiceMessage::FetchDone { result, .. }) => {
                assert!(matches!(result, Err(WeatherError::Interrupted)));
            }
            other => unreachable!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn panicking_fetch_reports_interrupted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticket = ticket_for(Arc::new(PanickingApi));

        request_fetch(&tx, Arc::new(PanickingApi), ticket, &CancellationToken::new());

        match rx.recv().await {
            Some(WeatherServiceMessage::FetchDone { result, .. }) => {
                assert!(matches!(result, Err(WeatherError::Interrupted)));
            }
            other => unreachable!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn location_reports_coordinates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let provider = Arc::new(FixedLocation(Coordinates::new(10.0, 20.0)));

        request_location(&tx, provider, &CancellationToken::new());

        match rx.recv().await {
            Some(WeatherServiceMessage::LocationDone(Ok(coords))) => {
                assert_eq!(coords, Coordinates::new(10.0, 20.0));
            }
            other => unreachable!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn location_reports_denial() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        request_location(&tx, Arc::new(DeniedLocation), &CancellationToken::new());

        match rx.recv().await {
            Some(WeatherServiceMessage::LocationDone(Err(WeatherError::Location(e)))) => {
                assert_eq!(e, LocationError::PermissionDenied);
            }
            other => unreachable!("unexpected message: {:?}", other),
        }
    }
}
