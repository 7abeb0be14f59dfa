//! SkyCast view layer
//!
//! Holds the weather view controller, the async service layer that runs
//! lookups off the event loop, and the plain-text renderer.

mod error_mapping;
pub mod models;
pub mod render;
pub mod services;

pub use models::weather_model::{Ticket, WeatherViewController};
pub use render::render_view;
pub use services::{WeatherError, WeatherServiceMessage};
