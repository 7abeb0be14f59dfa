use std::sync::Arc;

use skycast_core::{AppError, RacePolicy, ViewEvent, ViewState};
use skycast_weather::{Coordinates, LocationProvider, WeatherApi, WeatherQuery, WeatherReport};

use crate::services::weather_service::WeatherError;

/// Handle for one started lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    generation: u64,
    query: WeatherQuery,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &WeatherQuery {
        &self.query
    }
}

/// Drives the weather view: location bootstrap, lookups, and the state they leave behind.
///
/// The controller is only mutated from one place (the event loop or an awaiting
/// caller). Lookups can either be awaited directly (`fetch_by_*`) or split into
/// `begin` / `settle` so the network work runs elsewhere.
pub struct WeatherViewController<A> {
    api: Arc<A>,
    state: ViewState,
    coordinates: Option<Coordinates>,
    location_settled: bool,
    latest: u64,
    policy: RacePolicy,
}

impl<A: WeatherApi> WeatherViewController<A> {
    pub fn new(api: Arc<A>, policy: RacePolicy) -> Self {
        Self {
            api,
            state: ViewState::Idle,
            coordinates: None,
            location_settled: false,
            latest: 0,
            policy,
        }
    }

    pub fn api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn render(&self) -> String {
        crate::render::render_view(&self.state)
    }

    fn apply(&mut self, event: ViewEvent) {
        self.state = std::mem::take(&mut self.state).reduce(event);
    }

    /// Ask the provider where we are, then look the weather up there.
    ///
    /// Runs once; later calls do nothing.
    pub async fn initialize_location<P: LocationProvider>(&mut self, provider: &P) {
        if self.location_settled {
            tracing::debug!("Location already resolved, ignoring");
            return;
        }

        let result = provider.locate().await.map_err(WeatherError::from);
        if let Some(query) = self.on_location(result) {
            self.run(query).await;
        }
    }

    pub async fn fetch_by_coordinates(&mut self, coords: Coordinates) {
        self.run(WeatherQuery::Coordinates(coords)).await;
    }

    /// Blank names are ignored without touching the view.
    pub async fn fetch_by_district(&mut self, raw: &str) {
        if let Some(query) = self.district_query(raw) {
            self.run(query).await;
        }
    }

    async fn run(&mut self, query: WeatherQuery) {
        let ticket = self.begin(query);
        let api = Arc::clone(&self.api);
        let result = api.fetch(ticket.query()).await.map_err(WeatherError::from);
        self.settle(ticket, result);
    }

    /// Record the location result. Returns the lookup to start, if any.
    pub fn on_location(
        &mut self,
        result: Result<Coordinates, WeatherError>,
    ) -> Option<WeatherQuery> {
        if self.location_settled {
            tracing::debug!("Location already resolved, ignoring");
            return None;
        }
        self.location_settled = true;

        match result {
            Ok(coords) => {
                tracing::info!("Got location: {}", coords);
                self.coordinates = Some(coords);
                Some(WeatherQuery::Coordinates(coords))
            }
            Err(e) => {
                let app_err = AppError::from(e);
                tracing::warn!("{} ({})", app_err, app_err.user_message());
                self.apply(ViewEvent::LocationDenied);
                None
            }
        }
    }

    /// Turn search input into a query; `None` for blank input.
    pub fn district_query(&self, raw: &str) -> Option<WeatherQuery> {
        let query = WeatherQuery::district(raw);
        if query.is_none() {
            tracing::debug!("Ignoring blank district search");
        }
        query
    }

    /// Mark a lookup as started.
    pub fn begin(&mut self, query: WeatherQuery) -> Ticket {
        self.latest += 1;
        tracing::info!("Fetching weather for {} (request {})", query, self.latest);
        self.apply(ViewEvent::FetchStarted);
        Ticket {
            generation: self.latest,
            query,
        }
    }

    /// Apply a finished lookup. Returns false when the result was discarded.
    pub fn settle(&mut self, ticket: Ticket, result: Result<WeatherReport, WeatherError>) -> bool {
        if self.policy == RacePolicy::LatestRequest && ticket.generation != self.latest {
            tracing::debug!(
                "Discarding stale result for {} (request {}, latest {})",
                ticket.query,
                ticket.generation,
                self.latest
            );
            return false;
        }

        let event = match result {
            Ok(report) => {
                tracing::info!(
                    "Weather for {}: {}, {}",
                    ticket.query,
                    report.snapshot.district,
                    report.snapshot.state
                );
                ViewEvent::FetchSucceeded(report)
            }
            Err(e) => {
                let message = e.display_message(&ticket.query);
                let app_err = AppError::from(e);
                tracing::warn!(
                    "Lookup for {} failed: {} ({})",
                    ticket.query,
                    app_err,
                    app_err.user_message()
                );
                ViewEvent::FetchFailed(message)
            }
        };

        self.apply(event);
        true
    }
}
