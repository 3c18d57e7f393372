pub mod errors;
pub mod models;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crate::manager_advisory::errors::FormatError;
use crate::manager_advisory::models::{Advisory, DailySummary, HourlySeries, PrimaryAdvice};
use crate::markdown::escape_markdown;

const HOURS_PER_DAY: usize = 24;
const FORECAST_DAYS: usize = 3;
const SWING_THRESHOLD: f64 = 15.0;

/// Builds a farming advisory from an hourly temperature series
///
/// Days are fixed 24 sample windows counted from the first sample, so they follow
/// the hours since series start rather than local midnight. A day is only summarized
/// if its window is complete. Nothing in here panics, every problem with the input
/// comes back as a `FormatError`.
///
/// # Arguments
///
/// * 'series' - hourly temperatures, `None` if the forecast had no hourly block
/// * 'location' - label of the location the forecast is for
pub fn build_advisory(series: Option<&HourlySeries>, location: &str) -> Result<Advisory, FormatError> {
    let series = match series {
        Some(s) if !s.timestamps.is_empty() && !s.temperatures.is_empty() => s,
        _ => return Err(FormatError::IncompleteData),
    };

    let current_temperature = finite(series.temperatures[0], 0)?;

    let mut daily: Vec<DailySummary> = Vec::new();
    for day in 0..FORECAST_DAYS {
        let start = day * HOURS_PER_DAY;
        let Some(window) = series.temperatures.get(start..start + HOURS_PER_DAY) else {
            break;
        };

        let (min_temperature, max_temperature) = window
            .iter()
            .enumerate()
            .try_fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (i, &t)| -> Result<(f64, f64), FormatError> {
                let t = finite(t, start + i)?;
                Ok((min.min(t), max.max(t)))
            })?;

        let timestamp = series.timestamps.get(start)
            .ok_or_else(|| FormatError::ProcessingError(format!("no timestamp for sample {}", start)))?;

        daily.push(DailySummary {
            date: parse_timestamp(timestamp)?,
            min_temperature,
            max_temperature,
        });
    }

    let swing_warning = daily.first().is_some_and(|d| d.swing() > SWING_THRESHOLD);

    Ok(Advisory {
        location: location.to_string(),
        current_temperature,
        daily,
        primary: PrimaryAdvice::for_temperature(current_temperature),
        swing_warning,
    })
}

impl Advisory {
    /// Renders the advisory as a Telegram (legacy) Markdown message
    ///
    /// # Arguments
    ///
    /// * 'generated_at' - local time shown as the time of the advisory
    pub fn render(&self, generated_at: NaiveDateTime) -> String {
        let mut message = String::from("🌾 *Meghdoot Weather Advisory* 🌾\n");
        message.push_str(&format!("📍 *Location:* {}\n", escape_markdown(&self.location)));
        message.push_str(&format!("⏰ *Time:* {}\n\n", generated_at.format("%d %b %Y, %I:%M %p")));

        message.push_str("*🌡️ CURRENT CONDITIONS:*\n");
        message.push_str(&format!("• Temperature: {:.1}°C\n\n", self.current_temperature));

        message.push_str("*📅 3-DAY FORECAST:*\n");
        for day in self.daily.iter() {
            message.push_str(&format!("• {}: {:.0}-{:.0}°C\n",
                                      day.date.format("%a, %d %b"), day.min_temperature, day.max_temperature));
        }

        message.push_str("\n*⚠️ FARMING RECOMMENDATIONS:*\n");
        for line in self.advice_lines() {
            message.push_str(&format!("• {}\n", line));
        }

        message.push_str("\n_Data: Open-Meteo | Free Weather API_ ☁️\n");
        message.push_str("🔄 Send location again for updated forecast");

        message
    }
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses an ISO-8601 timestamp into its wall clock time
///
/// Accepts full RFC 3339 (including a trailing `Z`), the offset-less minute or second
/// precision form that Open-Meteo returns for `timezone=auto`, fractional seconds,
/// a space instead of the `T` and a bare date, which is taken as midnight.
///
/// # Arguments
///
/// * 'timestamp' - the timestamp to parse
fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime, FormatError> {
    let normalized = match (timestamp.get(..10), timestamp.get(10..11), timestamp.get(11..)) {
        (Some(date), Some(" "), Some(time)) => format!("{}T{}", date, time),
        _ => timestamp.to_string(),
    };

    if let Ok(date_time) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(date_time.naive_local());
    }
    if let Ok(date_time) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z") {
        return Ok(date_time.naive_local());
    }

    let naive = normalized.strip_suffix('Z').unwrap_or(&normalized);
    for format in NAIVE_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(date_time);
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| FormatError::ProcessingError(format!("malformed timestamp '{}'", timestamp)))
}

fn finite(temp: f64, index: usize) -> Result<f64, FormatError> {
    if temp.is_finite() {
        Ok(temp)
    } else {
        Err(FormatError::ProcessingError(format!("temperature missing at sample {}", index)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};
    use super::*;
    use crate::manager_advisory::models::{GENERAL_ADVICE, SWING_ADVICE};

    fn series(temperatures: Vec<f64>) -> HourlySeries {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let timestamps = (0..temperatures.len())
            .map(|h| (start + TimeDelta::hours(h as i64)).format("%Y-%m-%dT%H:%M").to_string())
            .collect();

        HourlySeries { timestamps, temperatures }
    }

    fn mild(hours: usize) -> Vec<f64> {
        (0..hours).map(|h| 20.0 + (h % 24) as f64 * 0.25).collect()
    }

    #[test]
    fn three_days_from_seven_day_series() {
        let advisory = build_advisory(Some(&series(mild(168))), "Farm").unwrap();

        assert_eq!(advisory.daily.len(), 3);
        assert_eq!(advisory.current_temperature, 20.0);
        assert_eq!(advisory.primary, PrimaryAdvice::Normal);
        assert!(!advisory.swing_warning);
        assert_eq!(advisory.advice_lines().len(), 1 + GENERAL_ADVICE.len());

        let dates: Vec<String> = advisory.daily.iter().map(|d| d.date.format("%a %d").to_string()).collect();
        assert_eq!(dates, vec!["Sat 01", "Sun 02", "Mon 03"]);
        assert_eq!(advisory.daily[0].min_temperature, 20.0);
        assert_eq!(advisory.daily[0].max_temperature, 25.75);
    }

    #[test]
    fn exactly_seventy_two_hours() {
        let advisory = build_advisory(Some(&series(mild(72))), "Farm").unwrap();
        assert_eq!(advisory.daily.len(), 3);
    }

    #[test]
    fn partial_day_is_skipped() {
        let advisory = build_advisory(Some(&series(mild(47))), "Farm").unwrap();
        assert_eq!(advisory.daily.len(), 1);
    }

    #[test]
    fn less_than_a_day() {
        let advisory = build_advisory(Some(&series(vec![12.5; 10])), "Farm").unwrap();

        assert!(advisory.daily.is_empty());
        assert_eq!(advisory.current_temperature, 12.5);
        assert!(!advisory.swing_warning);
    }

    #[test]
    fn incomplete_data() {
        assert_eq!(build_advisory(None, "Farm"), Err(FormatError::IncompleteData));
        assert_eq!(build_advisory(Some(&HourlySeries::default()), "Farm"), Err(FormatError::IncompleteData));

        let no_timestamps = HourlySeries { timestamps: Vec::new(), temperatures: mild(72) };
        assert_eq!(build_advisory(Some(&no_timestamps), "Farm"), Err(FormatError::IncompleteData));
    }

    #[test]
    fn heat_stress_wins_over_normal() {
        let mut temps = vec![30.0; 72];
        temps[0] = 36.0;
        let advisory = build_advisory(Some(&series(temps)), "Farm").unwrap();

        assert_eq!(advisory.primary, PrimaryAdvice::HeatStress);
        assert!(!advisory.advice_lines().contains(&PrimaryAdvice::Normal.text()));
    }

    #[test]
    fn frost_risk() {
        let advisory = build_advisory(Some(&series(vec![5.0; 30])), "Farm").unwrap();
        assert_eq!(advisory.primary, PrimaryAdvice::FrostRisk);
    }

    #[test]
    fn rule_boundaries() {
        assert_eq!(PrimaryAdvice::for_temperature(35.0), PrimaryAdvice::HighTemperature);
        assert_eq!(PrimaryAdvice::for_temperature(32.0), PrimaryAdvice::Normal);
        assert_eq!(PrimaryAdvice::for_temperature(32.1), PrimaryAdvice::HighTemperature);
        assert_eq!(PrimaryAdvice::for_temperature(10.0), PrimaryAdvice::CoolConditions);
        assert_eq!(PrimaryAdvice::for_temperature(9.9), PrimaryAdvice::FrostRisk);
        assert_eq!(PrimaryAdvice::for_temperature(15.0), PrimaryAdvice::Normal);
    }

    #[test]
    fn large_swing_adds_line() {
        let mut temps = vec![20.0; 72];
        temps[3] = 10.0;
        temps[14] = 28.0;
        let advisory = build_advisory(Some(&series(temps)), "Farm").unwrap();

        assert!(advisory.swing_warning);
        let lines = advisory.advice_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], PrimaryAdvice::Normal.text());
        assert_eq!(lines[1], SWING_ADVICE);
    }

    #[test]
    fn constant_temperature() {
        let advisory = build_advisory(Some(&series(vec![18.0; 24])), "Farm").unwrap();
        assert_eq!(advisory.daily[0].min_temperature, advisory.daily[0].max_temperature);
    }

    #[test]
    fn malformed_timestamp() {
        let mut s = series(mild(48));
        s.timestamps[24] = "tomorrow".to_string();

        assert!(matches!(build_advisory(Some(&s), "Farm"), Err(FormatError::ProcessingError(_))));
    }

    #[test]
    fn missing_timestamp_for_day() {
        let mut s = series(mild(48));
        s.timestamps.truncate(10);

        assert!(matches!(build_advisory(Some(&s), "Farm"), Err(FormatError::ProcessingError(_))));
    }

    #[test]
    fn missing_temperature() {
        let mut temps = mild(72);
        temps[40] = f64::NAN;

        assert!(matches!(build_advisory(Some(&series(temps)), "Farm"), Err(FormatError::ProcessingError(_))));
    }

    #[test]
    fn timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(5, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2024-06-01T05:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30:00+05:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30+05:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30:00.000").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01T05:30:00.250Z").unwrap(),
                   expected + TimeDelta::milliseconds(250));
        assert_eq!(parse_timestamp("2024-06-01 05:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01 05:30:00.000+05:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-06-01").unwrap(), expected - TimeDelta::minutes(330));
    }

    #[test]
    fn timestamp_rejects() {
        assert!(parse_timestamp("tomorrow").is_err());
        assert!(parse_timestamp("2024-13-01T05:30").is_err());
        assert!(parse_timestamp("2024-06-01T25:00").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2024-06-01\u{a0}05:30").is_err());
    }

    #[test]
    fn space_separated_series() {
        let mut s = series(mild(72));
        for t in s.timestamps.iter_mut() {
            *t = t.replacen('T', " ", 1) + ":00.000";
        }

        let advisory = build_advisory(Some(&s), "Farm").unwrap();
        assert_eq!(advisory.daily.len(), 3);
        assert_eq!(advisory.daily[1].date,
                   NaiveDate::from_ymd_opt(2024, 6, 2).unwrap().and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn deterministic() {
        let s = series(mild(100));
        assert_eq!(build_advisory(Some(&s), "Farm"), build_advisory(Some(&s), "Farm"));
    }

    #[test]
    fn render_message() {
        let mut temps = mild(72);
        temps[0] = 33.4;
        let advisory = build_advisory(Some(&series(temps)), "Rampur_Khas").unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(14, 5, 0).unwrap();
        let message = advisory.render(at);

        assert!(message.contains("📍 *Location:* Rampur\\_Khas\n"));
        assert!(message.contains("⏰ *Time:* 01 Jun 2024, 02:05 PM\n"));
        assert!(message.contains("• Temperature: 33.4°C\n"));
        assert!(message.contains("• Sat, 01 Jun: 20-33°C\n"));
        assert!(message.contains("• Mon, 03 Jun: 20-26°C\n"));
        assert!(message.contains(PrimaryAdvice::HighTemperature.text()));
        assert!(message.ends_with("updated forecast"));
    }
}
