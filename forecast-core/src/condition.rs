//! Condition vocabulary and icon lookup.
//!
//! Providers describe the sky in free text ("Clear", "light rain", "overcast
//! clouds"). Lookup is total: text that matches nothing lands on
//! [`DEFAULT_CONDITION`] so a record with an odd description still renders.

use serde::{Deserialize, Serialize};

/// Condition used for blank or unrecognised descriptions.
pub const DEFAULT_CONDITION: Condition = Condition::PartlyCloudy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Sleet,
    Snow,
    Thunderstorm,
}

impl Condition {
    /// Classify a free-text description. Never fails.
    ///
    /// Order matters: "heavy rain" must win over "rain", "partly cloudy" over
    /// "cloudy", "freezing drizzle" over "drizzle".
    pub fn from_description(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        let has = |needle: &str| text.contains(needle);

        if has("thunder") || has("storm") {
            Self::Thunderstorm
        } else if has("sleet") || has("freezing") {
            Self::Sleet
        } else if has("snow") || has("blizzard") {
            Self::Snow
        } else if has("heavy rain") || has("torrential") || has("heavy shower") {
            Self::HeavyRain
        } else if has("drizzle") {
            Self::Drizzle
        } else if has("rain") || has("shower") {
            Self::Rain
        } else if has("fog") || has("mist") || has("haze") || has("smoke") {
            Self::Fog
        } else if has("partly")
            || has("few clouds")
            || has("scattered clouds")
            || has("broken clouds")
        {
            Self::PartlyCloudy
        } else if has("cloud") || has("overcast") {
            Self::Cloudy
        } else if has("clear") || has("sunny") || has("sun") {
            Self::Clear
        } else {
            DEFAULT_CONDITION
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::PartlyCloudy => "partly cloudy",
            Self::Cloudy => "cloudy",
            Self::Fog => "fog",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::HeavyRain => "heavy rain",
            Self::Sleet => "sleet",
            Self::Snow => "snow",
            Self::Thunderstorm => "thunderstorm",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "cloud_rain",
            Self::Sleet | Self::Snow => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
