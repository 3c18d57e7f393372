mod bot;
mod diagnostics;
mod errors;
mod handlers;
mod initialization;
mod logging;
mod manager_advisory;
mod manager_nominatim;
mod manager_open_meteo;
mod manager_polling;
mod manager_telegram;
mod markdown;
#[cfg(test)]
mod test_support;

use std::sync::Arc;
use actix_web::{web, App, HttpServer};
use log::{error, info, warn};
use crate::bot::Bot;
use crate::diagnostics::{register_webhook, run_diagnostics};
use crate::errors::UnrecoverableError;
use crate::handlers::{routes, AppState};
use crate::initialization::{config, Command, Config, TransportMode};
use crate::manager_nominatim::Nominatim;
use crate::manager_open_meteo::OpenMeteo;
use crate::manager_polling::run_polling;
use crate::manager_telegram::Telegram;

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    let (command, config) = config()?;

    let telegram = Telegram::new(
        &config.telegram.api_url,
        &config.telegram.token,
        config.telegram.request_timeout,
        config.telegram.connect_timeout,
        config.telegram.poll_timeout,
        config.telegram.proxy.as_deref(),
    )?;

    match command {
        Command::Diagnose => {
            run_diagnostics(&telegram, &config.telegram.token).await;
            Ok(())
        },
        Command::SetWebhook => {
            let public_url = config.web_server.public_url.as_deref()
                .ok_or(UnrecoverableError("no public url configured, set [web_server] public_url or RAILWAY_STATIC_URL".to_string()))?;
            register_webhook(&telegram, &config.telegram.token, public_url, config.web_server.webhook_secret.as_deref()).await
        },
        Command::Run => run(telegram, config).await,
    }
}

/// Runs the bot in the configured transport mode
///
/// # Arguments
///
/// * 'telegram' - Telegram client
/// * 'config' - the configuration
async fn run(telegram: Telegram, config: Config) -> Result<(), UnrecoverableError> {
    let weather = OpenMeteo::new(&config.weather.api_url, config.weather.forecast_days, config.weather.timeout)?;
    let geocoder = if config.geocoding.enabled {
        Some(Nominatim::new(&config.geocoding.api_url, &config.geocoding.user_agent, config.geocoding.timeout)?)
    } else {
        None
    };

    match telegram.get_me().await {
        Ok(me) => info!("meghdoot bot starting as @{}", me.user.username.clone().unwrap_or_default()),
        Err(e) => error!("failed to reach Telegram: {}", e),
    }

    let bot = Arc::new(Bot::new(telegram, weather, geocoder));

    match config.transport.mode {
        TransportMode::Polling => run_polling(bot, config.telegram.poll_timeout).await,
        TransportMode::Webhook => {
            match &config.web_server.public_url {
                Some(public_url) => {
                    if let Err(e) = register_webhook(bot.telegram(), &config.telegram.token, public_url,
                                                     config.web_server.webhook_secret.as_deref()).await {
                        error!("{}", e);
                    }
                },
                None => warn!("no public url configured, webhook not registered"),
            }

            let state = web::Data::new(AppState {
                bot,
                token: config.telegram.token.clone(),
                public_url: config.web_server.public_url.clone(),
                webhook_secret: config.web_server.webhook_secret.clone(),
            });

            info!("starting web server on {}:{}", config.web_server.bind_address, config.web_server.bind_port);
            HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .configure(routes)
            })
                .bind((config.web_server.bind_address.as_str(), config.web_server.bind_port))?
                .run()
                .await?;
        }
    }

    Ok(())
}
