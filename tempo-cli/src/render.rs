//! Terminal rendering of the composed view model.

use tempo_core::{ConditionCategory, ViewModel, WeatherReport, format_temperature};

/// One glyph per condition bucket.
pub fn condition_icon(condition: ConditionCategory) -> &'static str {
    match condition {
        ConditionCategory::None => "·",
        ConditionCategory::Clear => "☀",
        ConditionCategory::Clouds => "☁",
        ConditionCategory::Rain => "🌧",
        ConditionCategory::Snow => "❄",
        ConditionCategory::Fog => "🌫",
        ConditionCategory::Thunderstorm => "⛈",
    }
}

pub fn view_model(vm: &ViewModel) {
    for line in view_model_lines(vm) {
        println!("{line}");
    }
}

fn view_model_lines(vm: &ViewModel) -> Vec<String> {
    if vm.loading {
        return vec!["Buscando...".to_string()];
    }

    if !vm.error.is_empty() {
        return vec![vm.error.clone()];
    }

    match &vm.weather_data {
        Some(report) => report_lines(report, vm.condition),
        None => vec!["Nenhuma busca realizada.".to_string()],
    }
}

fn report_lines(report: &WeatherReport, condition: ConditionCategory) -> Vec<String> {
    let location = match &report.country {
        Some(country) => format!("{}, {}", report.location_name, country),
        None => report.location_name.clone(),
    };

    let mut lines = vec![
        format!("{} {}", condition_icon(condition), location),
        format!("Temperatura: {}", format_temperature(report.temperature_c, 0)),
        format!(
            "Sensação térmica: {}",
            format_temperature(report.feels_like_c, 0)
        ),
        format!(
            "Mínima / máxima: {} / {}",
            format_temperature(report.temp_min_c, 0),
            format_temperature(report.temp_max_c, 0)
        ),
        format!("Umidade: {}%", report.humidity_pct),
        format!("Vento: {:.1} m/s", report.wind_speed_mps),
    ];

    if let Some(entry) = report.conditions.first() {
        lines.push(format!("Condição: {}", entry.description));
    }

    lines.push(format!(
        "Atualizado às {} UTC",
        report.observation_time.format("%H:%M")
    ));

    lines
}
