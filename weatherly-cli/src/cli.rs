use std::{fmt, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{InquireError, Password, Select, Text};
use weatherly_core::{
    Config, Coordinates, DisplayPreferences, Orchestrator, Session,
    TemperatureUnit, WindSpeedUnit,
    channel::{
        CommandRecognizer, FixedPosition, GeolocationAdapter, IpLocator, PositionSensor,
        SpeechRecognizer, VoiceAdapter,
    },
    providers_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherly", version, about = "Current weather and tomorrow's estimate")]
pub struct Cli {
    /// Temperature unit for display.
    #[arg(long, value_enum, global = true, default_value_t = TempArg::Celsius)]
    pub units: TempArg,

    /// Wind speed unit for display.
    #[arg(long, value_enum, global = true, default_value_t = WindArg::Mps)]
    pub wind: WindArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TempArg {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindArg {
    Mps,
    Kmh,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, prediction service and voice command.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name.
        city: String,
    },

    /// Show weather for the current position.
    Locate {
        /// Latitude; skips the IP locator when given together with --lon.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Dictate a city name with the configured voice command.
    Listen,

    /// Search repeatedly, switch units and channels in one session.
    Interactive,
}

impl Cli {
    fn preferences(&self) -> DisplayPreferences {
        DisplayPreferences {
            temperature: match self.units {
                TempArg::Celsius => TemperatureUnit::Celsius,
                TempArg::Fahrenheit => TemperatureUnit::Fahrenheit,
            },
            wind_speed: match self.wind {
                WindArg::Mps => WindSpeedUnit::MetersPerSecond,
                WindArg::Kmh => WindSpeedUnit::KilometersPerHour,
            },
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let preferences = self.preferences();

        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => {
                let mut session = build_session(&Config::load()?, preferences, None)?;
                session.search(city).await;
                finish(&session)
            }
            Command::Locate { lat, lon } => {
                let fixed = lat.zip(lon).map(|(latitude, longitude)| Coordinates {
                    latitude,
                    longitude,
                });
                let mut session = build_session(&Config::load()?, preferences, fixed)?;
                session.detect_location().await;
                finish(&session)
            }
            Command::Listen => {
                let mut session = build_session(&Config::load()?, preferences, None)?;
                if session.voice_enabled() {
                    println!("Listening...");
                }
                session.voice_search().await;
                finish(&session)
            }
            Command::Interactive => {
                let mut session = build_session(&Config::load()?, preferences, None)?;
                interactive(&mut session).await
            }
        }
    }
}

/// Probe capabilities once and wire everything into a session.
fn build_session(
    config: &Config,
    preferences: DisplayPreferences,
    fixed: Option<Coordinates>,
) -> anyhow::Result<Session> {
    let providers = providers_from_config(config).context("Failed to build HTTP clients")?;
    let orchestrator = Arc::new(Orchestrator::new(providers, config.resolve_credential()));

    let recognizer = CommandRecognizer::probe(&config.voice)
        .map(|r| Arc::new(r) as Arc<dyn SpeechRecognizer>);

    let sensor: Option<Arc<dyn PositionSensor>> = match fixed {
        Some(position) => Some(Arc::new(FixedPosition(position))),
        None => IpLocator::probe(&config.geolocation).map(|l| Arc::new(l) as Arc<dyn PositionSensor>),
    };

    Ok(Session::new(orchestrator, VoiceAdapter::new(recognizer), GeolocationAdapter::new(sensor))
        .with_preferences(preferences))
}

/// Print the result of a one-shot command; user-visible errors become the exit error.
fn finish(session: &Session) -> anyhow::Result<()> {
    if let Some(message) = session.error_message() {
        bail!(message);
    }
    match session.view() {
        Some(view) => println!("{}", render::weather_card(&view)),
        None => println!("No city recognized."),
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let current_prediction = config.endpoints.prediction_url.clone();
    config.endpoints.prediction_url = Text::new("Prediction service URL:")
        .with_default(&current_prediction)
        .prompt()?;

    let current_voice = config.voice.command.clone().unwrap_or_default();
    let voice = Text::new("Voice dictation command (empty to disable):")
        .with_default(&current_voice)
        .prompt()?;
    config.voice.command = Some(voice.trim().to_string()).filter(|c| !c.is_empty());

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    Voice,
    Locate,
    ToggleTemperature,
    ToggleWind,
    CloseDetails,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Search => "Search a city",
            Action::Voice => "Tap to speak",
            Action::Locate => "Detect my location",
            Action::ToggleTemperature => "Switch °C / °F",
            Action::ToggleWind => "Switch m/s / km/h",
            Action::CloseDetails => "Close weather details",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Only controls that can act right now are offered.
fn available_actions(session: &Session) -> Vec<Action> {
    let mut actions = Vec::new();
    if session.controls_enabled() {
        actions.push(Action::Search);
        if session.voice_enabled() {
            actions.push(Action::Voice);
        }
        if session.geolocation_enabled() {
            actions.push(Action::Locate);
        }
    }
    if session.details_visible() {
        actions.extend([Action::ToggleTemperature, Action::ToggleWind, Action::CloseDetails]);
    }
    actions.push(Action::Quit);
    actions
}

async fn interactive(session: &mut Session) -> anyhow::Result<()> {
    loop {
        let action = match Select::new("What next?", available_actions(session)).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match action {
            Action::Search => {
                let city = Text::new("City:").with_default(session.city_input()).prompt()?;
                println!("Loading...");
                session.search(city).await;
            }
            Action::Voice => {
                println!("Listening...");
                if session.voice_search().await.is_none() && session.error_message().is_none() {
                    println!("Nothing recognized.");
                    continue;
                }
            }
            Action::Locate => {
                println!("Loading...");
                session.detect_location().await;
            }
            Action::ToggleTemperature => {
                let next = match session.preferences().temperature {
                    TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
                    TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
                };
                session.set_temperature_unit(next);
            }
            Action::ToggleWind => {
                let next = match session.preferences().wind_speed {
                    WindSpeedUnit::MetersPerSecond => WindSpeedUnit::KilometersPerHour,
                    WindSpeedUnit::KilometersPerHour => WindSpeedUnit::MetersPerSecond,
                };
                session.set_wind_speed_unit(next);
            }
            Action::CloseDetails => {
                session.close_details();
                continue;
            }
            Action::Quit => break,
        }

        render::print_session(session);
    }

    Ok(())
}
