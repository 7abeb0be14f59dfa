//! Weather view state machine.
//!
//! The view is always in exactly one of four states. Transitions go through
//! [`ViewState::reduce`] so loading, error and data can never drift apart.

use skycast_weather::WeatherReport;

/// Shown when the device location could not be obtained.
pub const LOCATION_DENIED: &str = "Location access denied.";

/// What the weather view currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A lookup is in flight; the last report stays on screen until it settles
    Loading { previous: Option<WeatherReport> },
    Loaded(WeatherReport),
    /// The last lookup failed; an earlier report is kept, not blanked
    Failed {
        message: String,
        previous: Option<WeatherReport>,
    },
}

/// Something that happened to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    FetchStarted,
    FetchSucceeded(WeatherReport),
    FetchFailed(String),
    LocationDenied,
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }

    /// Error line text; empty when there is no error.
    pub fn error_message(&self) -> &str {
        match self {
            ViewState::Failed { message, .. } => message,
            _ => "",
        }
    }

    /// The report on screen, if any.
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            ViewState::Idle => None,
            ViewState::Loaded(report) => Some(report),
            ViewState::Loading { previous } | ViewState::Failed { previous, .. } => {
                previous.as_ref()
            }
        }
    }

    fn into_report(self) -> Option<WeatherReport> {
        match self {
            ViewState::Idle => None,
            ViewState::Loaded(report) => Some(report),
            ViewState::Loading { previous } | ViewState::Failed { previous, .. } => previous,
        }
    }

    /// State after `event`.
    pub fn reduce(self, event: ViewEvent) -> Self {
        match event {
            // Starting a lookup clears any error but keeps the report visible
            ViewEvent::FetchStarted => ViewState::Loading {
                previous: self.into_report(),
            },
            ViewEvent::FetchSucceeded(report) => ViewState::Loaded(report),
            ViewEvent::FetchFailed(message) => ViewState::Failed {
                message,
                previous: self.into_report(),
            },
            ViewEvent::LocationDenied => match self {
                // A search is in flight; its outcome decides what is shown
                loading @ ViewState::Loading { .. } => loading,
                other => ViewState::Failed {
                    message: LOCATION_DENIED.to_string(),
                    previous: other.into_report(),
                },
            },
        }
    }
}
