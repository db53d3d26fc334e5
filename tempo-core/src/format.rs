//! Temperature display formatting.

/// Renders a temperature fixed to `decimals` digits, with the `˚C` suffix.
pub fn format_temperature(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}˚C")
}

/// Same, for values that arrive as text (form fields, raw API payloads).
///
/// Non-numeric input renders as `NaN˚C`, matching the permissive numeric
/// coercion of the UI this formatter came from.
pub fn format_temperature_str(value: &str, decimals: usize) -> String {
    let parsed = value.trim().parse::<f64>().unwrap_or(f64::NAN);
    format_temperature(parsed, decimals)
}
