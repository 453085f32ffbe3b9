//! Presentation state: what a front end needs to draw the app.
//!
//! A [`Session`] owns the text field value, the display preferences, the last
//! channel error and whether the details panel is open. It routes every input
//! channel through the shared [`Orchestrator`].

use std::sync::Arc;

use crate::{
    channel::{GeolocationAdapter, VoiceAdapter, text_query},
    error::ChannelError,
    model::{CurrentConditions, LocationQuery, PredictedConditions},
    orchestrator::{AcquisitionState, Orchestrator},
    units::{
        DisplayPreferences, TemperatureUnit, WindSpeedUnit, to_display_predicted_temperature,
        to_display_temperature, to_display_wind_speed,
    },
};

pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{:.1}{}", to_display_temperature(celsius, unit), unit.symbol())
}

pub fn format_wind_speed(meters_per_second: f64, unit: WindSpeedUnit) -> String {
    format!("{:.1} {}", to_display_wind_speed(meters_per_second, unit), unit.symbol())
}

/// "light rain" -> "Light Rain"
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display-ready strings for one set of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherView {
    pub city: String,
    pub temperature: String,
    pub wind_speed: String,
    pub description: String,
    pub humidity: String,
    pub pressure: String,
    pub cloudiness: String,
    pub icon_url: String,
    /// Tomorrow's estimate; absent when the prediction service gave nothing.
    pub tomorrow: Option<String>,
}

impl WeatherView {
    pub fn derive(
        current: &CurrentConditions,
        predicted: Option<&PredictedConditions>,
        preferences: DisplayPreferences,
    ) -> Self {
        let tomorrow = predicted.map(|p| {
            let value =
                to_display_predicted_temperature(p.temp_min_c, p.temp_max_c, preferences.temperature);
            format!("{value:.1}{}", preferences.temperature.symbol())
        });

        Self {
            city: current.city_name.clone(),
            temperature: format_temperature(current.temperature_c, preferences.temperature),
            wind_speed: format_wind_speed(current.wind_speed_mps, preferences.wind_speed),
            description: title_case(&current.description),
            humidity: format!("{} %", current.humidity_pct),
            pressure: format!("{} hPa", current.pressure_hpa),
            cloudiness: format!("{} %", current.cloudiness_pct),
            icon_url: current.icon_url(),
            tomorrow,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    orchestrator: Arc<Orchestrator>,
    voice: VoiceAdapter,
    geolocation: GeolocationAdapter,
    preferences: DisplayPreferences,
    city_input: String,
    channel_error: Option<ChannelError>,
    details_open: bool,
}

impl Session {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        voice: VoiceAdapter,
        geolocation: GeolocationAdapter,
    ) -> Self {
        Self {
            orchestrator,
            voice,
            geolocation,
            preferences: DisplayPreferences::default(),
            city_input: String::new(),
            channel_error: None,
            details_open: false,
        }
    }

    pub fn with_preferences(mut self, preferences: DisplayPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn voice(&self) -> &VoiceAdapter {
        &self.voice
    }

    pub fn city_input(&self) -> &str {
        &self.city_input
    }

    pub fn set_city_input(&mut self, value: impl Into<String>) {
        self.city_input = value.into();
    }

    pub fn preferences(&self) -> DisplayPreferences {
        self.preferences
    }

    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.preferences.temperature = unit;
    }

    pub fn set_wind_speed_unit(&mut self, unit: WindSpeedUnit) {
        self.preferences.wind_speed = unit;
    }

    pub fn state(&self) -> AcquisitionState {
        self.orchestrator.state()
    }

    /// Query-triggering controls are disabled while a query is loading.
    pub fn controls_enabled(&self) -> bool {
        !self.state().is_loading()
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice.is_enabled()
    }

    pub fn geolocation_enabled(&self) -> bool {
        self.geolocation.is_enabled()
    }

    /// Submit the text field. `None` when controls are disabled.
    pub async fn submit_text(&mut self) -> Option<AcquisitionState> {
        if !self.controls_enabled() {
            return None;
        }
        let query = text_query(&self.city_input);
        Some(self.resolve(query).await)
    }

    pub async fn search(&mut self, city: impl Into<String>) -> Option<AcquisitionState> {
        self.set_city_input(city);
        self.submit_text().await
    }

    /// Dictate a city name into the text field and resolve it.
    pub async fn voice_search(&mut self) -> Option<AcquisitionState> {
        if !self.controls_enabled() {
            return None;
        }
        self.channel_error = None;

        match self.voice.listen().await {
            Ok(Some(transcript)) => {
                self.city_input = transcript;
                let query = text_query(&self.city_input);
                Some(self.resolve(query).await)
            }
            Ok(None) => None,
            Err(err) => {
                self.channel_error = Some(err);
                None
            }
        }
    }

    /// Resolve the device position; on success the text field shows the returned city name.
    pub async fn detect_location(&mut self) -> Option<AcquisitionState> {
        if !self.controls_enabled() {
            return None;
        }
        self.channel_error = None;

        let query = match self.geolocation.locate().await {
            Ok(query) => query,
            Err(err) => {
                self.channel_error = Some(err);
                return None;
            }
        };

        let state = self.resolve(query).await;
        if let Some(label) = self.orchestrator.snapshot().location_label {
            self.city_input = label;
        }
        Some(state)
    }

    async fn resolve(&mut self, query: LocationQuery) -> AcquisitionState {
        self.channel_error = None;
        let state = self.orchestrator.resolve(query).await;
        self.details_open = self.orchestrator.snapshot().current.is_some();
        state
    }

    pub fn details_visible(&self) -> bool {
        self.details_open && self.orchestrator.snapshot().current.is_some()
    }

    pub fn close_details(&mut self) {
        self.details_open = false;
    }

    /// The single user-visible error string, if any.
    pub fn error_message(&self) -> Option<String> {
        if let Some(err) = self.channel_error {
            return Some(err.user_message());
        }
        self.state().failure().map(|reason| reason.user_message())
    }

    /// Current results in the selected units. Re-derived on every call.
    pub fn view(&self) -> Option<WeatherView> {
        let snapshot = self.orchestrator.snapshot();
        snapshot
            .current
            .as_ref()
            .map(|current| WeatherView::derive(current, snapshot.predicted.as_ref(), self.preferences))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::FixedPosition,
        error::AcquisitionError,
        model::Coordinates,
        testing::{
            FakeConditions, FakePrediction, Reply, ScriptedRecognizer, conditions, prediction,
            providers,
        },
    };
    use tokio::sync::Notify;

    fn session_with(fc: &Arc<FakeConditions>, fp: &Arc<FakePrediction>) -> Session {
        let orch = Arc::new(Orchestrator::new(providers(fc, fp), Some("KEY".into())));
        Session::new(orch, VoiceAdapter::disabled(), GeolocationAdapter::default())
    }

    fn paris() -> (Arc<FakeConditions>, Arc<FakePrediction>) {
        (
            Arc::new(FakeConditions::default().reply("Paris", Reply::Ok(conditions("Paris", 15.0, 5.0)))),
            Arc::new(FakePrediction::default().reply("Paris", prediction("Paris", 10.0, 20.0))),
        )
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("light rain"), "Light Rain");
        assert_eq!(title_case("overcast clouds"), "Overcast Clouds");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn formatting_rounds_to_one_decimal() {
        assert_eq!(format_temperature(21.456, TemperatureUnit::Celsius), "21.5°C");
        assert_eq!(format_temperature(0.0, TemperatureUnit::Fahrenheit), "32.0°F");
        assert_eq!(format_wind_speed(10.0, WindSpeedUnit::KilometersPerHour), "36.0 km/h");
        assert_eq!(format_wind_speed(5.0, WindSpeedUnit::MetersPerSecond), "5.0 m/s");
    }

    #[tokio::test]
    async fn paris_scenario_renders_celsius() {
        let (fc, fp) = paris();
        let mut session = session_with(&fc, &fp);

        let state = session.search("Paris").await;
        assert_eq!(state, Some(AcquisitionState::Ready));

        let view = session.view().expect("view after success");
        assert_eq!(view.city, "Paris");
        assert_eq!(view.temperature, "15.0°C");
        assert_eq!(view.wind_speed, "5.0 m/s");
        assert_eq!(view.tomorrow.as_deref(), Some("15.0°C"));
        assert_eq!(view.description, "Scattered Clouds");
        assert_eq!(view.pressure, "1013 hPa");
        assert!(session.details_visible());
        assert_eq!(session.error_message(), None);
    }

    #[tokio::test]
    async fn changing_units_rederives_without_fetching() {
        let (fc, fp) = paris();
        let mut session = session_with(&fc, &fp);
        session.search("Paris").await;

        session.set_temperature_unit(TemperatureUnit::Fahrenheit);
        session.set_wind_speed_unit(WindSpeedUnit::KilometersPerHour);

        let view = session.view().expect("view after success");
        assert_eq!(view.temperature, "59.0°F");
        assert_eq!(view.wind_speed, "18.0 km/h");
        assert_eq!(view.tomorrow.as_deref(), Some("59.0°F"));
        assert_eq!(fc.calls(), 1);
        assert_eq!(fp.calls(), 1);
    }

    #[tokio::test]
    async fn nowhereville_shows_not_found() {
        let fc = Arc::new(FakeConditions::default().reply("Nowhereville", Reply::NotFound));
        let fp = Arc::new(FakePrediction::default());
        let mut session = session_with(&fc, &fp);

        let state = session.search("Nowhereville").await;
        assert_eq!(state, Some(AcquisitionState::Failed(AcquisitionError::NotFound)));
        assert_eq!(
            session.error_message().as_deref(),
            Some("City not found. Please check the city name.")
        );
        assert!(session.view().is_none());
        assert!(!session.details_visible());
        assert_eq!(fp.calls(), 0);
    }

    #[tokio::test]
    async fn prediction_failure_is_not_user_visible() {
        let fc = Arc::new(FakeConditions::default().reply("Paris", Reply::Ok(conditions("Paris", 15.0, 5.0))));
        let fp = Arc::new(FakePrediction::default());
        let mut session = session_with(&fc, &fp);

        assert_eq!(session.search("Paris").await, Some(AcquisitionState::Ready));
        assert_eq!(session.error_message(), None);
        let view = session.view().expect("current conditions shown");
        assert!(view.tomorrow.is_none());
    }

    #[tokio::test]
    async fn closing_details_hides_panel_until_next_result() {
        let (fc, fp) = paris();
        let mut session = session_with(&fc, &fp);

        session.search("Paris").await;
        session.close_details();
        assert!(!session.details_visible());

        session.submit_text().await;
        assert!(session.details_visible());
    }

    #[tokio::test]
    async fn voice_transcript_fills_text_and_resolves() {
        let (fc, fp) = paris();
        let orch = Arc::new(Orchestrator::new(providers(&fc, &fp), Some("KEY".into())));
        let mut session = Session::new(
            orch,
            VoiceAdapter::new(Some(ScriptedRecognizer::saying("Paris"))),
            GeolocationAdapter::default(),
        );

        assert!(session.voice_enabled());
        assert_eq!(session.voice_search().await, Some(AcquisitionState::Ready));
        assert_eq!(session.city_input(), "Paris");
        assert_eq!(fc.calls(), 1);
    }

    #[tokio::test]
    async fn silent_voice_attempt_does_not_resolve() {
        let (fc, fp) = paris();
        let orch = Arc::new(Orchestrator::new(providers(&fc, &fp), Some("KEY".into())));
        let mut session = Session::new(
            orch,
            VoiceAdapter::new(Some(ScriptedRecognizer::new(Ok(vec![])))),
            GeolocationAdapter::default(),
        );

        assert_eq!(session.voice_search().await, None);
        assert_eq!(session.state(), AcquisitionState::Idle);
        assert_eq!(session.error_message(), None);
        assert_eq!(fc.calls(), 0);
    }

    #[tokio::test]
    async fn unavailable_voice_sets_channel_error_only() {
        let (fc, fp) = paris();
        let mut session = session_with(&fc, &fp);

        assert!(!session.voice_enabled());
        assert_eq!(session.voice_search().await, None);
        assert_eq!(
            session.error_message().as_deref(),
            Some("Voice input is not supported on this device.")
        );
        assert_eq!(session.state(), AcquisitionState::Idle);
        assert_eq!(fc.calls(), 0);
    }

    #[tokio::test]
    async fn detected_location_adopts_returned_city_name() {
        let fc = Arc::new(
            FakeConditions::default().reply("48.85,2.35", Reply::Ok(conditions("Paris", 15.0, 5.0))),
        );
        let fp = Arc::new(FakePrediction::default().reply("Paris", prediction("Paris", 10.0, 20.0)));
        let orch = Arc::new(Orchestrator::new(providers(&fc, &fp), Some("KEY".into())));
        let mut session = Session::new(
            orch,
            VoiceAdapter::disabled(),
            GeolocationAdapter::new(Some(Arc::new(FixedPosition(Coordinates {
                latitude: 48.85,
                longitude: 2.35,
            })))),
        );

        assert_eq!(session.detect_location().await, Some(AcquisitionState::Ready));
        assert_eq!(session.city_input(), "Paris");
        assert_eq!(session.view().and_then(|v| v.tomorrow).as_deref(), Some("15.0°C"));
    }

    #[tokio::test]
    async fn missing_sensor_reports_location_unavailable() {
        let (fc, fp) = paris();
        let mut session = session_with(&fc, &fp);

        assert_eq!(session.detect_location().await, None);
        assert_eq!(
            session.error_message().as_deref(),
            Some("Unable to retrieve your location.")
        );
        assert_eq!(fc.calls(), 0);
    }

    #[tokio::test]
    async fn channel_error_is_cleared_by_next_query() {
        let (fc, fp) = paris();
        let mut session = session_with(&fc, &fp);

        session.detect_location().await;
        assert!(session.error_message().is_some());

        session.search("Paris").await;
        assert_eq!(session.error_message(), None);
    }

    #[tokio::test]
    async fn controls_are_disabled_while_loading() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let fc = Arc::new(
            FakeConditions::default()
                .reply("Lima", Reply::Ok(conditions("Lima", 19.0, 3.0)))
                .gated("Lima", started.clone(), release.clone()),
        );
        let fp = Arc::new(FakePrediction::default());
        let orch = Arc::new(Orchestrator::new(providers(&fc, &fp), Some("KEY".into())));

        let mut first = Session::new(orch.clone(), VoiceAdapter::disabled(), GeolocationAdapter::default());
        let mut second = Session::new(orch, VoiceAdapter::disabled(), GeolocationAdapter::default());

        let loading = first.search("Lima");
        let probe = async {
            started.notified().await;
            let enabled = second.controls_enabled();
            let submitted = second.search("Quito").await;
            release.notify_one();
            (enabled, submitted)
        };
        let (state, (enabled, submitted)) = tokio::join!(loading, probe);

        assert!(!enabled);
        assert_eq!(submitted, None);
        assert_eq!(state, Some(AcquisitionState::Ready));
        assert_eq!(fc.calls(), 1);
    }
}
