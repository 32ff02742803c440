use thiserror::Error;

/// Failures a forecast request can end in.
///
/// Every variant is caught at the session boundary and turned into an error
/// banner; none of them reach presentation as a panic or an unhandled error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    /// Blank search input. Rejected without touching the session.
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("City '{city}' not found")]
    NotFound { city: String },

    /// Transport or provider failure.
    #[error("Weather provider unavailable: {0}")]
    Unavailable(String),

    /// A record came back without the fields the normalizer needs.
    #[error("Malformed weather record: {0}")]
    MalformedRecord(String),
}

impl ForecastError {
    pub fn not_found(city: impl Into<String>) -> Self {
        Self::NotFound { city: city.into() }
    }

    /// Banner text shown to the user.
    ///
    /// Malformed records read the same as an unavailable provider: the user can
    /// only retry either way.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "Enter a city name to search.",
            Self::NotFound { .. } => "City not found. Please check your spelling and try again.",
            Self::Unavailable(_) | Self::MalformedRecord(_) => {
                "Weather data is unavailable right now. Please try again in a moment."
            }
        }
    }
}
