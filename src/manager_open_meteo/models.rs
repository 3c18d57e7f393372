use serde::Deserialize;
use crate::manager_advisory::models::HourlySeries;

#[derive(Deserialize)]
pub struct Hourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
}

#[derive(Deserialize)]
pub struct FullForecast {
    pub hourly: Option<Hourly>,
}

impl From<Hourly> for HourlySeries {
    /// Hours the model has no value for become NaN and are rejected when the advisory is built
    fn from(hourly: Hourly) -> Self {
        HourlySeries {
            timestamps: hourly.time,
            temperatures: hourly.temperature_2m
                .into_iter()
                .map(|t| t.unwrap_or(f64::NAN))
                .collect(),
        }
    }
}
