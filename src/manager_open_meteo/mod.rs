pub mod errors;
mod models;

use std::time::Duration;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use crate::manager_advisory::models::HourlySeries;
use crate::manager_open_meteo::errors::OpenMeteoError;
use crate::manager_open_meteo::models::FullForecast;

#[derive(Deserialize)]
struct ErrorReason {
    reason: String,
}

/// Struct for fetching hourly temperature forecasts from Open-Meteo
pub struct OpenMeteo {
    client: Client,
    api_url: String,
    forecast_days: u8,
}

impl OpenMeteo {
    /// Returns an OpenMeteo struct ready for fetching forecasts
    ///
    /// # Arguments
    ///
    /// * 'api_url' - url to the Open-Meteo forecast endpoint
    /// * 'forecast_days' - number of days to request, at least 3 for a full advisory
    /// * 'timeout' - timeout for the whole request
    pub fn new(api_url: &str, forecast_days: u8, timeout: Duration) -> Result<OpenMeteo, OpenMeteoError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            forecast_days,
        })
    }

    /// Retrieves hourly temperatures for the given location in its own timezone.
    /// Returns `Ok(None)` if the response carried no hourly block at all.
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'long' - longitude of the location
    pub async fn hourly_forecast(&self, lat: f64, long: f64) -> Result<Option<HourlySeries>, OpenMeteoError> {
        debug!("fetching forecast for {:.4}, {:.4}", lat, long);

        let req = self.client
            .get(&self.api_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", long.to_string()),
                ("hourly", "temperature_2m".to_string()),
                ("forecast_days", self.forecast_days.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send().await?;

        let status = req.status();
        let json = req.text().await?;
        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorReason>(&json)
                .map(|e| e.reason)
                .unwrap_or_default();
            return Err(OpenMeteoError::OpenMeteo(format!("Error while fetching forecast: {} {}", status, reason)));
        }

        parse_forecast(&json)
    }
}

/// Decodes a forecast document into an hourly series
///
/// # Arguments
///
/// * 'json' - response body from the forecast endpoint
fn parse_forecast(json: &str) -> Result<Option<HourlySeries>, OpenMeteoError> {
    let forecast: FullForecast = serde_json::from_str(json)?;

    Ok(forecast.hourly.map(HourlySeries::from))
}
