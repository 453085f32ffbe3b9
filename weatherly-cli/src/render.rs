use weatherly_core::{Session, WeatherView};

pub fn weather_card(view: &WeatherView) -> String {
    let mut lines = vec![
        view.city.clone(),
        format!("  Weather:      {}", view.description),
        format!("  Temperature:  {}", view.temperature),
        format!("  Wind Speed:   {}", view.wind_speed),
        format!("  Humidity:     {}", view.humidity),
        format!("  Pressure:     {}", view.pressure),
        format!("  Cloudiness:   {}", view.cloudiness),
    ];

    if let Some(tomorrow) = &view.tomorrow {
        lines.push(String::new());
        lines.push(format!("  Predicted Temperature for Tomorrow: {tomorrow}"));
    }

    lines.join("\n")
}

/// Print whatever the session currently has to show.
pub fn print_session(session: &Session) {
    if let Some(message) = session.error_message() {
        eprintln!("{message}");
    }

    if session.details_visible() {
        if let Some(view) = session.view() {
            println!("{}", weather_card(&view));
        }
    }
}
