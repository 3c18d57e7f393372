use chrono::NaiveDateTime;

/// Hourly temperature samples, ascending in time, one per hour
///
/// Timestamps are kept as received so that malformed values surface when
/// the advisory is built rather than when the payload is decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    pub timestamps: Vec<String>,
    pub temperatures: Vec<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDateTime,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl DailySummary {
    pub fn swing(&self) -> f64 {
        self.max_temperature - self.min_temperature
    }
}

/// Advice picked from the current temperature, first matching rule wins
///
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimaryAdvice {
    HeatStress,
    HighTemperature,
    FrostRisk,
    CoolConditions,
    Normal,
}

impl PrimaryAdvice {
    /// Selects advice for the given temperature in Celsius
    ///
    /// # Arguments
    ///
    /// * 'temp' - current temperature
    pub fn for_temperature(temp: f64) -> Self {
        if temp > 35.0 {
            PrimaryAdvice::HeatStress
        } else if temp > 32.0 {
            PrimaryAdvice::HighTemperature
        } else if temp < 10.0 {
            PrimaryAdvice::FrostRisk
        } else if temp < 15.0 {
            PrimaryAdvice::CoolConditions
        } else {
            PrimaryAdvice::Normal
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            PrimaryAdvice::HeatStress => "🔥 Heat stress risk - irrigate early morning, provide shade",
            PrimaryAdvice::HighTemperature => "☀️ High temperature - ensure adequate irrigation",
            PrimaryAdvice::FrostRisk => "❄️ Frost risk - protect sensitive crops with covers",
            PrimaryAdvice::CoolConditions => "🌡️ Cool conditions - delay planting of heat-sensitive crops",
            PrimaryAdvice::Normal => "🌡️ Normal temperature range - regular farming activities",
        }
    }
}

pub const SWING_ADVICE: &str = "📊 Large temperature swing - monitor crop stress";

pub const GENERAL_ADVICE: [&str; 2] = [
    "🌱 Inspect crops regularly for pest and disease",
    "💧 Water plants in early morning or late evening",
];

/// Everything a forecast reply is made of
///
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub location: String,
    pub current_temperature: f64,
    pub daily: Vec<DailySummary>,
    pub primary: PrimaryAdvice,
    pub swing_warning: bool,
}

impl Advisory {
    /// All advice lines in reply order: primary, optional swing, general
    pub fn advice_lines(&self) -> Vec<&'static str> {
        let mut lines = vec![self.primary.text()];
        if self.swing_warning {
            lines.push(SWING_ADVICE);
        }
        lines.extend(GENERAL_ADVICE);

        lines
    }
}
