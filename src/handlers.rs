use std::sync::Arc;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::Local;
use log::{error, warn};
use serde::Serialize;
use teloxide::types::Update;
use crate::bot::Bot;
use crate::diagnostics::register_webhook;

const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

pub struct AppState {
    pub bot: Arc<Bot>,
    pub token: String,
    pub public_url: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    bot: &'static str,
    time: String,
}

#[derive(Serialize)]
struct SetWebhookResult {
    success: bool,
    message: String,
}

/// Registers all webhook mode routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(health)
        .service(set_webhook)
        .service(webhook);
}

#[get("/")]
async fn home() -> impl Responder {
    HttpResponse::Ok().body("🌾 Meghdoot Weather Bot is running 24/7! ✅")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(Health { status: "healthy", bot: "Meghdoot", time: Local::now().to_rfc3339() })
}

/// Telegram posts updates here, the path segment has to be the bot token
///
/// Once an update is accepted the answer is always 200, Telegram would otherwise
/// redeliver it and the user would get the same reply again.
#[post("/{token}")]
async fn webhook(req: HttpRequest, token: web::Path<String>, body: web::Bytes, data: web::Data<AppState>) -> impl Responder {
    if token.into_inner() != data.token {
        return HttpResponse::NotFound().finish();
    }

    if let Some(secret) = &data.webhook_secret {
        let given = req.headers().get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(secret.as_str()) {
            warn!("webhook request without valid secret token");
            return HttpResponse::Forbidden().finish();
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("webhook error: {}", e);
            return HttpResponse::BadRequest().finish();
        }
    };

    if let Err(e) = data.bot.handle_update(update).await {
        error!("failed to handle update: {}", e);
    }

    HttpResponse::Ok().body("OK")
}

/// Registers the configured public url as the bot's webhook
///
/// The url comes from configuration only, never from request headers.
#[get("/set_webhook")]
async fn set_webhook(data: web::Data<AppState>) -> impl Responder {
    let Some(public_url) = &data.public_url else {
        warn!("webhook registration requested but no public url is configured");
        return HttpResponse::ServiceUnavailable().json(SetWebhookResult {
            success: false,
            message: "No public url configured".to_string(),
        });
    };

    match register_webhook(data.bot.telegram(), &data.token, public_url, data.webhook_secret.as_deref()).await {
        Ok(()) => HttpResponse::Ok().json(SetWebhookResult {
            success: true,
            message: "Webhook set successfully".to_string(),
        }),
        Err(e) => {
            error!("failed to set webhook: {}", e);
            HttpResponse::InternalServerError().json(SetWebhookResult {
                success: false,
                message: "Failed to set webhook".to_string(),
            })
        }
    }
}
