use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::model::{Coordinates, PositionError, PositionResult};

use super::GeolocationProvider;

const GEOLOCATE_URL: &str = "http://ip-api.com/json";

/// Resolves the machine's approximate position from its public IP.
///
/// The terminal analog of a browser geolocation prompt: one lookup per
/// call, and every failure mode collapses into a coded `PositionError`
/// instead of surfacing as a Rust error.
#[derive(Debug, Clone)]
pub struct IpApiProvider {
    http: Client,
}

impl IpApiProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for IP geolocation")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl GeolocationProvider for IpApiProvider {
    async fn get_position(&self) -> PositionResult {
        info!("resolving position from public IP");

        let res = match self.http.get(GEOLOCATE_URL).send().await {
            Ok(res) => res,
            Err(err) => {
                warn!(error = %err, "geolocation request failed");
                return Err(PositionError::Unsupported);
            }
        };

        let status = res.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            warn!(%status, "geolocation service refused the request");
            return Err(PositionError::PermissionDenied);
        }
        if !status.is_success() {
            warn!(%status, "geolocation service unavailable");
            return Err(PositionError::Unavailable);
        }

        let parsed: IpApiResponse = match res.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "geolocation response unreadable");
                return Err(PositionError::Unsupported);
            }
        };

        position_from_response(parsed)
    }
}

fn position_from_response(parsed: IpApiResponse) -> PositionResult {
    if parsed.status != "success" {
        warn!(
            status = %parsed.status,
            message = parsed.message.as_deref().unwrap_or(""),
            "geolocation lookup did not succeed"
        );
        return Err(PositionError::Unavailable);
    }

    match (parsed.lat, parsed.lon) {
        (Some(latitude), Some(longitude)) => {
            info!(
                latitude,
                longitude,
                city = parsed.city.as_deref().unwrap_or("?"),
                "position resolved"
            );
            Ok(Coordinates {
                latitude,
                longitude,
            })
        }
        _ => Err(PositionError::Unavailable),
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}
