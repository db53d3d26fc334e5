use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::model::{ConditionEntry, Query, WeatherReport};

use super::WeatherDataProvider;

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    lang: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, lang: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self { api_key, lang, http })
    }

    async fn fetch_current(&self, query: &Query) -> Result<Option<WeatherReport>> {
        let mut request = self.http.get(CURRENT_WEATHER_URL).query(&[
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
            ("lang", self.lang.as_str()),
        ]);

        request = match query {
            Query::CityName(name) => request.query(&[("q", name.as_str())]),
            Query::Coordinates(coords) => request.query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ]),
        };

        let res = request
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        if status == StatusCode::NOT_FOUND {
            debug!(?query, "OpenWeather reported no matching location");
            return Ok(None);
        }

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let report = parse_current_body(&body)?;
        info!(location = %report.location_name, "weather report received");

        Ok(Some(report))
    }
}

fn parse_current_body(body: &str) -> Result<WeatherReport> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;

    let observation_time = DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now);

    let conditions = parsed
        .weather
        .into_iter()
        .map(|w| ConditionEntry {
            main: w.main,
            description: w.description,
        })
        .collect();

    Ok(WeatherReport {
        location_name: parsed.name,
        country: parsed.sys.and_then(|sys| sys.country),
        conditions,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        temp_min_c: parsed.main.temp_min,
        temp_max_c: parsed.main.temp_max,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        observation_time,
    })
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: Option<OwSys>,
}

#[async_trait]
impl WeatherDataProvider for OpenWeatherProvider {
    async fn get_weather_data(&self, query: &Query) -> Result<Option<WeatherReport>> {
        self.fetch_current(query).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
