pub mod errors;

use std::time::Duration;
use log::debug;
use reqwest::{Client, Proxy, Url};
use teloxide::payloads::setters::*;
use teloxide::requests::Requester;
use teloxide::types::{AllowedUpdate, ChatAction, ChatId, KeyboardMarkup, Me, ParseMode, Update, WebhookInfo};
use teloxide::{Bot, RequestError};
use crate::manager_telegram::errors::TelegramError;

/// Thin layer over teloxide's Bot holding the client settings and keeping the token out of errors
pub struct Telegram {
    bot: Bot,
    token: String,
}

impl Telegram {
    /// Returns a Telegram struct ready for calling Bot API methods
    ///
    /// # Arguments
    ///
    /// * 'api_url' - Bot API base url, normally https://api.telegram.org
    /// * 'token' - the bot token
    /// * 'timeout' - timeout for a request on top of the long poll time
    /// * 'connect_timeout' - timeout for establishing a connection
    /// * 'poll_timeout' - how long Telegram may hold a getUpdates request
    /// * 'proxy' - optional proxy url to route all requests through
    pub fn new(api_url: &str, token: &str, timeout: Duration, connect_timeout: Duration,
               poll_timeout: Duration, proxy: Option<&str>) -> Result<Telegram, TelegramError> {
        let mut builder = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout + poll_timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        let bot = Bot::with_client(token, builder.build()?)
            .set_api_url(parse_url(api_url)?);

        Ok(Self { bot, token: token.to_string() })
    }

    /// Returns the bot's own identity
    pub async fn get_me(&self) -> Result<Me, TelegramError> {
        self.bot.get_me().await.map_err(|e| self.error(e))
    }

    /// Long polls for new messages
    ///
    /// # Arguments
    ///
    /// * 'offset' - identifier of the first update to return, confirms all before it
    /// * 'poll_timeout' - how long the server may hold the request while waiting for updates
    pub async fn get_updates(&self, offset: Option<i32>, poll_timeout: Duration) -> Result<Vec<Update>, TelegramError> {
        let mut request = self.bot.get_updates()
            .timeout(u32::try_from(poll_timeout.as_secs()).unwrap_or(u32::MAX))
            .allowed_updates(vec![AllowedUpdate::Message]);
        if let Some(offset) = offset {
            request = request.offset(offset);
        }

        request.await.map_err(|e| self.error(e))
    }

    /// Sends a text message
    ///
    /// # Arguments
    ///
    /// * 'chat_id' - chat to send to
    /// * 'text' - message text
    /// * 'markdown' - whether the text is legacy Markdown
    /// * 'keyboard' - optional reply keyboard to show
    pub async fn send_message(&self, chat_id: ChatId, text: &str, markdown: bool, keyboard: Option<KeyboardMarkup>)
        -> Result<(), TelegramError> {
        let mut request = self.bot.send_message(chat_id, text);
        if markdown {
            request = request.parse_mode(legacy_markdown());
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }

        let message = request.await.map_err(|e| self.error(e))?;
        debug!("sent message {} to chat {}", message.id.0, chat_id);
        Ok(())
    }

    /// Shows the typing indicator in a chat
    pub async fn send_typing(&self, chat_id: ChatId) -> Result<(), TelegramError> {
        self.bot.send_chat_action(chat_id, ChatAction::Typing).await
            .map(|_| ())
            .map_err(|e| self.error(e))
    }

    /// Registers a webhook url, restricted to message updates
    ///
    /// # Arguments
    ///
    /// * 'url' - https url Telegram should post updates to
    /// * 'secret_token' - optional secret Telegram echoes in every webhook request
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), TelegramError> {
        let mut request = self.bot.set_webhook(parse_url(url)?)
            .allowed_updates(vec![AllowedUpdate::Message]);
        if let Some(secret_token) = secret_token {
            request = request.secret_token(secret_token.to_string());
        }

        request.await
            .map(|_| ())
            .map_err(|e| self.error(e))
    }

    /// Removes any registered webhook so updates can be polled
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        self.bot.delete_webhook().await
            .map(|_| ())
            .map_err(|e| self.error(e))
    }

    /// Returns the current webhook registration
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.bot.get_webhook_info().await.map_err(|e| self.error(e))
    }

    fn error(&self, e: RequestError) -> TelegramError {
        match e {
            RequestError::Api(api) => TelegramError::Api(api.to_string()),
            other => TelegramError::Telegram(redact(&other.to_string(), &self.token)),
        }
    }
}

fn parse_url(url: &str) -> Result<Url, TelegramError> {
    Url::parse(url).map_err(|e| TelegramError::Url(format!("{}: {}", url, e)))
}

#[allow(deprecated)]
fn legacy_markdown() -> ParseMode {
    ParseMode::Markdown
}

fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        text.to_string()
    } else {
        text.replace(token, "<token>")
    }
}
