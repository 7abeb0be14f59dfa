//! Plain-text rendering of the weather view.

use std::fmt::Write;

use skycast_core::ViewState;
use skycast_weather::WeatherReport;

pub const TITLE: &str = "Weather App";
pub const LOADING: &str = "Loading weather data...";
pub const NO_FORECAST: &str = "No forecast data available.";

/// Render the whole view, top to bottom.
pub fn render_view(state: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE);

    if state.is_loading() {
        let _ = writeln!(out, "{}", LOADING);
    }

    let error = state.error_message();
    if !error.is_empty() {
        let _ = writeln!(out, "{}", error);
    }

    if let Some(report) = state.report() {
        render_report(&mut out, report);
    }

    out
}

fn render_report(out: &mut String, report: &WeatherReport) {
    let snapshot = &report.snapshot;

    let _ = writeln!(out);
    let _ = writeln!(out, "{}, {}", snapshot.district, snapshot.state);
    let _ = writeln!(out, "Temp: {}", snapshot.temperature);
    let _ = writeln!(out, "Condition: {}", snapshot.condition);
    let _ = writeln!(out, "Humidity: {}", snapshot.humidity);
    let _ = writeln!(out, "Wind: {}", snapshot.wind_speed);

    let _ = writeln!(out);
    let _ = writeln!(out, "5-Day Forecast");

    if report.forecast.is_empty() {
        let _ = writeln!(out, "{}", NO_FORECAST);
        return;
    }

    for entry in &report.forecast {
        let _ = writeln!(out, "  {}", entry.day);
        let _ = writeln!(out, "  {}", entry.condition);
        let _ = writeln!(out, "  High: {}", entry.high);
        let _ = writeln!(out, "  Low: {}", entry.low);
    }
}
