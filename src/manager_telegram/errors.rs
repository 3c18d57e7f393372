use std::fmt;

#[derive(Debug)]
pub enum TelegramError {
    Telegram(String),
    Api(String),
    Url(String),
}

impl fmt::Display for TelegramError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TelegramError::Telegram(e) => write!(f, "TelegramError::Telegram: {}", e),
            TelegramError::Api(e) => write!(f, "TelegramError::Api: {}", e),
            TelegramError::Url(e) => write!(f, "TelegramError::Url: {}", e),
        }
    }
}
impl From<reqwest::Error> for TelegramError {
    /// Request urls carry the bot token, so they are stripped before the error is kept
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Telegram(e.without_url().to_string())
    }
}
