use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    Config,
    model::{PositionResult, Query, WeatherReport},
    provider::{geoip::IpApiProvider, openweather::OpenWeatherProvider},
};

pub mod geoip;
pub mod openweather;

/// Asynchronous source of weather reports.
///
/// Exactly one outbound request per call. `Ok(None)` means the API found no
/// matching location; transport and protocol failures are `Err`, so callers
/// can tell a miss from a broken lookup.
#[async_trait]
pub trait WeatherDataProvider: Send + Sync + Debug {
    async fn get_weather_data(&self, query: &Query) -> anyhow::Result<Option<WeatherReport>>;
}

/// Asynchronous source of the machine's position.
///
/// Exactly one result per call, and failures are coded values rather than
/// errors: a host with no usable lookup path still yields a
/// `PositionError`, never a panic or an `Err` the caller must classify.
#[async_trait]
pub trait GeolocationProvider: Send + Sync + Debug {
    async fn get_position(&self) -> PositionResult;
}

/// Construct the weather provider from config.
///
/// Shared handles: the session hands the provider to per-query lookup tasks.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherDataProvider>> {
    let api_key = config.resolved_api_key()?;
    let provider = OpenWeatherProvider::new(api_key, config.lang.clone(), config.timeout())?;

    Ok(Arc::new(provider))
}

/// Construct the geolocation provider from config.
pub fn geolocation_provider_from_config(
    config: &Config,
) -> anyhow::Result<Arc<dyn GeolocationProvider>> {
    let provider = IpApiProvider::new(config.timeout())?;

    Ok(Arc::new(provider))
}
