pub mod errors;
mod models;

use std::time::Duration;
use reqwest::Client;
use crate::manager_nominatim::errors::NominatimError;
use crate::manager_nominatim::models::ReverseResult;

/// Struct for looking up place names for coordinates through Nominatim
pub struct Nominatim {
    client: Client,
    api_url: String,
}

impl Nominatim {
    /// Returns a Nominatim struct ready for reverse geocoding
    ///
    /// Nominatim's usage policy requires an identifying user agent on every request.
    ///
    /// # Arguments
    ///
    /// * 'api_url' - url to the reverse geocoding endpoint
    /// * 'user_agent' - user agent to identify the bot with
    /// * 'timeout' - timeout for the whole request
    pub fn new(api_url: &str, user_agent: &str, timeout: Duration) -> Result<Nominatim, NominatimError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, api_url: api_url.to_string() })
    }

    /// Returns the village, town or city name at the given location, if any
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'long' - longitude of the location
    pub async fn place_name(&self, lat: f64, long: f64) -> Result<Option<String>, NominatimError> {
        let req = self.client
            .get(&self.api_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", long.to_string()),
                ("format", "json".to_string()),
            ])
            .send().await?;

        let status = req.status();
        if !status.is_success() {
            return Err(NominatimError(format!("reverse lookup failed: {}", status)));
        }

        let json = req.text().await?;
        let result: ReverseResult = serde_json::from_str(&json)?;

        Ok(result.address.and_then(|a| a.place_name()))
    }
}
