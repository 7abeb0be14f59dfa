//! Weather data for SkyCast
//!
//! Talks to the district weather service, decodes its responses, and resolves
//! the device location used for the automatic lookup.

pub mod decode;
pub mod location;
pub mod provider;
pub mod types;

pub use decode::decode_report;
pub use location::{DeniedLocation, FixedLocation, IpLocation, LocationProvider};
pub use provider::{WeatherApi, WeatherClient};
pub use types::*;
