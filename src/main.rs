use std::sync::Arc;

use anyhow::{Context, Result};
use skycast_core::{AppError, Config, ConfigError, LocationMode};
use skycast_ui::services::{request_location, request_weather_fetch};
use skycast_ui::{WeatherError, WeatherServiceMessage, WeatherViewController};
use skycast_weather::{
    Coordinates, DeniedLocation, FixedLocation, IpLocation, WeatherApi, WeatherClient,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
Type a district name and press Enter to search.
  :help   show this message
  :q      quit";

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            let err = AppError::Config(ConfigError::ParseError(format!("{:#}", e)));
            eprintln!("{}", err.user_message());
            return Err(e);
        }
    };

    skycast_core::init(&config.view.log_filter)?;

    let (config, _) = config.into_validated().inspect_err(|e| {
        let err = AppError::Config(ConfigError::Invalid(e.to_string()));
        eprintln!("{}", err.user_message());
    })?;

    let client = WeatherClient::new(&config.service.base_url, config.service.timeout())
        .map_err(AppError::from)?;
    tracing::info!("Weather service at {}", client.endpoint());

    let mut view = WeatherViewController::new(Arc::new(client), config.view.race_policy);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    start_location(&config, &tx, &cancel);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_view(&view);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };

                match line.trim() {
                    ":q" => break,
                    ":help" => println!("{}", HELP),
                    raw => {
                        if let Some(query) = view.district_query(raw) {
                            let ticket = view.begin(query);
                            request_weather_fetch(&tx, view.api(), ticket, &cancel);
                            print_view(&view);
                        }
                    }
                }
            }
            Some(message) = rx.recv() => {
                if handle_message(&mut view, message, &tx, &cancel) {
                    print_view(&view);
                }
            }
        }
    }

    cancel.cancel();
    tracing::info!("SkyCast shutting down");

    Ok(())
}

/// Apply a service message. Returns true when the view changed.
fn handle_message<A: WeatherApi + 'static>(
    view: &mut WeatherViewController<A>,
    message: WeatherServiceMessage,
    tx: &UnboundedSender<WeatherServiceMessage>,
    cancel: &CancellationToken,
) -> bool {
    match message {
        WeatherServiceMessage::LocationDone(result) => {
            if let Some(query) = view.on_location(result) {
                let ticket = view.begin(query);
                request_weather_fetch(tx, view.api(), ticket, cancel);
            }
            true
        }
        WeatherServiceMessage::FetchDone { ticket, result } => view.settle(ticket, result),
    }
}

fn start_location(
    config: &Config,
    tx: &UnboundedSender<WeatherServiceMessage>,
    cancel: &CancellationToken,
) {
    let location = &config.location;
    match location.mode {
        LocationMode::Fixed => {
            let coords = Coordinates::new(location.latitude, location.longitude);
            request_location(tx, Arc::new(FixedLocation(coords)), cancel);
        }
        LocationMode::IpLookup => match IpLocation::new(location.lookup_url.clone()) {
            Ok(provider) => request_location(tx, Arc::new(provider), cancel),
            Err(e) => {
                let _ = tx.send(WeatherServiceMessage::LocationDone(Err(
                    WeatherError::Location(e),
                )));
            }
        },
        LocationMode::Disabled => request_location(tx, Arc::new(DeniedLocation), cancel),
    }
}

fn print_view<A: WeatherApi>(view: &WeatherViewController<A>) {
    println!("{}", view.render());
}
