use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};
use teloxide::types::{ButtonRequest, ChatId, KeyboardButton, KeyboardMarkup, Update, UpdateKind};
use crate::manager_advisory::build_advisory;
use crate::manager_advisory::models::HourlySeries;
use crate::manager_nominatim::Nominatim;
use crate::manager_open_meteo::OpenMeteo;
use crate::manager_telegram::errors::TelegramError;
use crate::manager_telegram::Telegram;
use crate::markdown::escape_markdown;

const SHARE_LOCATION_BUTTON: &str = "📍 Share Farm Location";
const FORECAST_BUTTON: &str = "🌦️ Get Weather Forecast";
const HELP_BUTTON: &str = "ℹ️ Help";

const FETCHING_REPLY: &str = "⏳ Fetching weather data for your farm...";
const FETCH_FAILED_REPLY: &str = "❌ Unable to fetch weather data. Please try again.";
const SHARE_LOCATION_REPLY: &str = "👇 Tap \"📍 Share Farm Location\" to get the forecast for your farm.";
const HELP_REPLY: &str = "*📖 Meghdoot Help Guide*\n\n\
    *Commands:*\n\
    /start - Start the bot\n\
    /help - Show this help\n\n\
    *How to use:*\n\
    1. Tap '📍 Share Farm Location' button\n\
    2. Allow location access\n\
    3. Get instant weather forecast\n\n\
    *Features:*\n\
    • Current temperature\n\
    • 3-day forecast\n\
    • Farming recommendations\n\
    • Hyperlocal weather data\n\n\
    _Powered by Open-Meteo API_ ☁️";

/// What a user asked for with an update
///
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Start { chat_id: ChatId, first_name: Option<String> },
    Help { chat_id: ChatId },
    ForecastPrompt { chat_id: ChatId },
    Forecast { chat_id: ChatId, latitude: f64, longitude: f64 },
}

/// Works out what an update asks for, `None` for anything the bot does not answer
///
/// # Arguments
///
/// * 'update' - update as received from Telegram
pub fn classify(update: &Update) -> Option<Request> {
    let UpdateKind::Message(message) = &update.kind else {
        return None;
    };
    let chat_id = message.chat.id;

    if let Some(location) = message.location() {
        return Some(Request::Forecast { chat_id, latitude: location.latitude, longitude: location.longitude });
    }

    let text = message.text()?.trim();
    if text == HELP_BUTTON {
        return Some(Request::Help { chat_id });
    }
    if text == FORECAST_BUTTON {
        return Some(Request::ForecastPrompt { chat_id });
    }

    // Commands may be addressed as /start@SomeBot in groups
    let command = text.split_whitespace().next()?;
    let command = command.split('@').next().unwrap_or(command);
    match command {
        "/start" => Some(Request::Start {
            chat_id,
            first_name: message.from.as_ref().map(|u| u.first_name.clone()),
        }),
        "/help" => Some(Request::Help { chat_id }),
        _ => None,
    }
}

/// The bot: answers commands and turns shared locations into weather advisories
pub struct Bot {
    telegram: Telegram,
    weather: OpenMeteo,
    geocoder: Option<Nominatim>,
}

impl Bot {
    /// Returns a new Bot
    ///
    /// # Arguments
    ///
    /// * 'telegram' - Telegram client used as reply sink
    /// * 'weather' - forecast source
    /// * 'geocoder' - optional reverse geocoder for location labels
    pub fn new(telegram: Telegram, weather: OpenMeteo, geocoder: Option<Nominatim>) -> Self {
        Self { telegram, weather, geocoder }
    }

    pub fn telegram(&self) -> &Telegram {
        &self.telegram
    }

    /// Handles one update, whichever transport it came in over
    ///
    /// # Arguments
    ///
    /// * 'update' - update as received from Telegram
    pub async fn handle_update(&self, update: Update) -> Result<(), TelegramError> {
        let Some(request) = classify(&update) else {
            debug!("ignoring update {}", update.id.0);
            return Ok(());
        };
        debug!("update {}: {:?}", update.id.0, request);

        match request {
            Request::Start { chat_id, first_name } => {
                let text = welcome_text(first_name.as_deref());
                self.telegram.send_message(chat_id, &text, true, Some(main_keyboard())).await?;
            },
            Request::Help { chat_id } => {
                self.telegram.send_message(chat_id, HELP_REPLY, true, None).await?;
            },
            Request::ForecastPrompt { chat_id } => {
                self.telegram.send_message(chat_id, SHARE_LOCATION_REPLY, false, Some(main_keyboard())).await?;
            },
            Request::Forecast { chat_id, latitude, longitude } => self.forecast(chat_id, latitude, longitude).await?,
        }

        Ok(())
    }

    /// Fetches, formats and sends an advisory for a shared location
    ///
    /// # Arguments
    ///
    /// * 'chat_id' - chat to reply to
    /// * 'latitude' - latitude of the shared location
    /// * 'longitude' - longitude of the shared location
    async fn forecast(&self, chat_id: ChatId, latitude: f64, longitude: f64) -> Result<(), TelegramError> {
        info!("forecast requested for {:.2}, {:.2}", latitude, longitude);

        if let Err(e) = self.telegram.send_typing(chat_id).await {
            warn!("failed to send chat action: {}", e);
        }
        self.telegram.send_message(chat_id, FETCHING_REPLY, false, None).await?;

        let reply = match self.weather.hourly_forecast(latitude, longitude).await {
            Ok(series) => {
                let label = self.location_label(latitude, longitude).await;
                advisory_reply(series.as_ref(), &label, Local::now().naive_local())
            },
            Err(e) => {
                error!("failed to get forecast: {}", e);
                FETCH_FAILED_REPLY.to_string()
            }
        };

        self.telegram.send_message(chat_id, &reply, true, None).await?;

        Ok(())
    }

    /// Place name for the location if one can be found, else its rounded coordinates
    ///
    /// # Arguments
    ///
    /// * 'latitude' - latitude of the shared location
    /// * 'longitude' - longitude of the shared location
    async fn location_label(&self, latitude: f64, longitude: f64) -> String {
        if let Some(geocoder) = &self.geocoder {
            match geocoder.place_name(latitude, longitude).await {
                Ok(Some(name)) => return name,
                Ok(None) => debug!("no place name for location"),
                Err(e) => warn!("reverse geocoding failed: {}", e),
            }
        }

        format!("{:.2}, {:.2}", latitude, longitude)
    }
}

/// Builds the reply text for a fetched forecast, substituting a fixed message if no advisory can be made
///
/// # Arguments
///
/// * 'series' - fetched hourly series, `None` if the forecast had none
/// * 'label' - location label
/// * 'now' - local time to stamp the advisory with
fn advisory_reply(series: Option<&HourlySeries>, label: &str, now: NaiveDateTime) -> String {
    match build_advisory(series, label) {
        Ok(advisory) => advisory.render(now),
        Err(e) => {
            error!("failed to build advisory: {}", e);
            e.user_message().to_string()
        }
    }
}

fn welcome_text(first_name: Option<&str>) -> String {
    let greeting = match first_name {
        Some(name) => format!("🌾 *Namaste {}!* 🌾\n\n", escape_markdown(name)),
        None => "🌾 *Namaste!* 🌾\n\n".to_string(),
    };

    format!("{}*Welcome to Meghdoot Weather Bot* ☁️\n\
             Your farming companion.\n\n\
             👇 *Share your location to get hyperlocal weather forecast*", greeting)
}

fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(SHARE_LOCATION_BUTTON).request(ButtonRequest::Location)],
        vec![KeyboardButton::new(FORECAST_BUTTON)],
        vec![KeyboardButton::new(HELP_BUTTON)],
    ])
        .resize_keyboard()
}
