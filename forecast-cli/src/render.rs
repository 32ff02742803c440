use std::fmt::Write;

use forecast_core::{CanonicalObservation, DailySummary, ForecastPoint, Phase, SessionState};

/// Plain-text rendering of a session: error banner first, then whatever data
/// the session holds.
pub fn session(state: &SessionState) -> String {
    let mut out = String::new();

    if let (Phase::Error, Some(message)) = (state.phase, &state.error_message) {
        let _ = writeln!(out, "! {message}");
        if state.has_data() {
            let _ = writeln!(out, "  (showing previous results)");
        }
        let _ = writeln!(out);
    }

    match &state.observation {
        Some(obs) => {
            observation(&mut out, obs);
            hourly(&mut out, &state.hourly);
            daily(&mut out, &state.daily);
        }
        None if state.phase == Phase::Idle => {
            let _ = writeln!(out, "Enter a city name to get current weather and forecasts.");
        }
        None => {}
    }

    out
}

fn observation(out: &mut String, obs: &CanonicalObservation) {
    let place = if obs.country.is_empty() {
        obs.city.clone()
    } else {
        format!("{}, {}", obs.city, obs.country)
    };

    let _ = writeln!(out, "{place}");
    let _ = writeln!(out, "  {}°C  {} [{}]", obs.temp_c, obs.condition, obs.condition_icon);

    let when = [obs.weekday.as_str(), obs.local_time.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" • ");
    if !when.is_empty() {
        let _ = writeln!(out, "  {when}");
    }

    let mut details = Vec::new();
    if let Some(t) = obs.feels_like_c {
        details.push(format!("feels like {t}°C"));
    }
    if let Some(h) = obs.humidity_pct {
        details.push(format!("humidity {h}%"));
    }
    if let Some(w) = obs.wind_kmh {
        details.push(format!("wind {w} km/h"));
    }
    if let Some(v) = obs.visibility_km {
        details.push(format!("visibility {v} km"));
    }
    if !details.is_empty() {
        let _ = writeln!(out, "  {}", details.join(", "));
    }
}

fn hourly(out: &mut String, points: &[ForecastPoint]) {
    if points.is_empty() {
        return;
    }

    let _ = writeln!(out, "\n24-hour forecast");
    for point in points {
        let _ = writeln!(out, "  {:>8}  {:>4}°  {}", point.label, point.temp_c, point.condition);
    }
}

fn daily(out: &mut String, days: &[DailySummary]) {
    if days.is_empty() {
        return;
    }

    let _ = writeln!(out, "\nDaily forecast");
    for day in days {
        let _ = writeln!(
            out,
            "  {:<10} {:>4}° | {:>4}°  {}",
            day.label, day.high_c, day.low_c, day.condition
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> CanonicalObservation {
        CanonicalObservation {
            city: "Tokyo".into(),
            country: "JP".into(),
            temp_c: 20,
            feels_like_c: None,
            humidity_pct: Some(40),
            wind_kmh: None,
            visibility_km: None,
            condition: "clear sky".into(),
            condition_icon: "sun".into(),
            weekday: "Wednesday".into(),
            local_time: "09:00".into(),
        }
    }

    #[test]
    fn idle_shows_welcome() {
        let text = session(&SessionState::default());
        assert!(text.contains("Enter a city name"));
    }

    #[test]
    fn success_shows_observation_without_missing_fields() {
        let state = SessionState {
            phase: Phase::Success,
            query: "Tokyo".into(),
            observation: Some(obs()),
            ..Default::default()
        };

        let text = session(&state);
        assert!(text.contains("Tokyo, JP"));
        assert!(text.contains("20°C  clear sky [sun]"));
        assert!(text.contains("Wednesday • 09:00"));
        assert!(text.contains("humidity 40%"));
        assert!(!text.contains("wind"));
        assert!(!text.contains("!"));
    }

    #[test]
    fn error_banner_sits_above_stale_data() {
        let state = SessionState {
            phase: Phase::Error,
            query: "invalid".into(),
            observation: Some(obs()),
            error_message: Some("City not found.".into()),
            ..Default::default()
        };

        let text = session(&state);
        assert!(text.starts_with("! City not found."));
        assert!(text.contains("showing previous results"));
        assert!(text.contains("Tokyo, JP"));
    }
}
