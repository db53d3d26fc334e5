use serde::{Deserialize, Serialize};

use crate::model::WeatherReport;

/// UI-facing weather condition buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConditionCategory {
    #[default]
    None,
    Clear,
    Clouds,
    Rain,
    Snow,
    Fog,
    Thunderstorm,
}

impl ConditionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::None => "none",
            ConditionCategory::Clear => "clear",
            ConditionCategory::Clouds => "clouds",
            ConditionCategory::Rain => "rain",
            ConditionCategory::Snow => "snow",
            ConditionCategory::Fog => "fog",
            ConditionCategory::Thunderstorm => "thunderstorm",
        }
    }

    pub const fn all() -> &'static [ConditionCategory] {
        &[
            ConditionCategory::None,
            ConditionCategory::Clear,
            ConditionCategory::Clouds,
            ConditionCategory::Rain,
            ConditionCategory::Snow,
            ConditionCategory::Fog,
            ConditionCategory::Thunderstorm,
        ]
    }
}

impl std::fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets a report's primary condition label.
///
/// Labels are matched case-sensitively against a fixed table. Anything not
/// in the table lands on `Clear`, which is also the explicit bucket for
/// "Clear" and "Tornado" — the fallback is intentional, not a gap. An
/// absent report is `None`.
pub fn classify(report: Option<&WeatherReport>) -> ConditionCategory {
    let Some(report) = report else {
        return ConditionCategory::None;
    };

    match report.primary_condition() {
        Some("Ash" | "Fog" | "Mist" | "Dust" | "Sand" | "Smoke") => ConditionCategory::Fog,
        Some("Clouds") => ConditionCategory::Clouds,
        Some("Rain" | "Drizzle") => ConditionCategory::Rain,
        Some("Snow") => ConditionCategory::Snow,
        Some("Thunderstorm" | "Squall") => ConditionCategory::Thunderstorm,
        _ => ConditionCategory::Clear,
    }
}
