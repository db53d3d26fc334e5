use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::ConditionCategory;

/// A single user intent to fetch weather: by city name or by coordinates.
///
/// Produced by exactly one of form submission or a successful geolocation
/// lookup; never both for the same event.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    CityName(String),
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of one geolocation attempt: coordinates, or a coded failure.
pub type PositionResult = Result<Coordinates, PositionError>;

/// Geolocation failures, keyed by the platform's numeric codes.
///
/// The `Display` strings are the user-facing messages, shown verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    /// Code 1.
    #[error(
        "Não há permissões para buscar sua localização. Conceda permissão para acessar o local e tente novamente."
    )]
    PermissionDenied,

    /// Code 2.
    #[error("O sinal de GPS não consegue alcançar sua posição no momento.")]
    Unavailable,

    /// Any other code: the host has no usable lookup path.
    #[error("O seu dispositivo não suporta busca a partir do GPS.")]
    Unsupported,
}

impl PositionError {
    pub const fn code(&self) -> u8 {
        match self {
            PositionError::PermissionDenied => 1,
            PositionError::Unavailable => 2,
            PositionError::Unsupported => 3,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => PositionError::PermissionDenied,
            2 => PositionError::Unavailable,
            _ => PositionError::Unsupported,
        }
    }
}

/// A parsed current-weather report.
///
/// `None` at the provider seam means "no matching location"; a present
/// report always carries the fields below, with `conditions` preserving the
/// API's ordering (the first entry is the primary one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location_name: String,
    pub country: Option<String>,
    pub conditions: Vec<ConditionEntry>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub observation_time: DateTime<Utc>,
}

/// One condition entry from the report: a closed-ish category label plus a
/// localized free-form description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub main: String,
    pub description: String,
}

impl WeatherReport {
    /// Primary condition label, i.e. the first entry's `main` field.
    pub fn primary_condition(&self) -> Option<&str> {
        self.conditions.first().map(|entry| entry.main.as_str())
    }
}

/// The composed projection rendered to the user.
///
/// A pure function of the session's current state; recomputed and published
/// on every transition, never stored anywhere.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewModel {
    pub weather_data: Option<WeatherReport>,
    pub loading: bool,
    pub error: String,
    pub condition: ConditionCategory,
}
