use std::time::Duration;
use log::{error, info, warn};
use reqwest::Client;
use crate::errors::UnrecoverableError;
use crate::manager_telegram::Telegram;

/// Checks token, bot identity, webhook registration and reachability of the webhook host
///
/// Problems are logged rather than returned, so that every check gets to run.
///
/// # Arguments
///
/// * 'telegram' - Telegram client
/// * 'token' - the bot token, only ever logged masked
pub async fn run_diagnostics(telegram: &Telegram, token: &str) {
    info!("token: {} ({} characters)", mask_token(token), token.chars().count());

    match telegram.get_me().await {
        Ok(me) => info!("bot connected: @{} (id {}, name {})",
                        me.user.username.clone().unwrap_or_default(), me.user.id.0, me.user.first_name),
        Err(e) => error!("failed to reach Telegram: {}", e),
    }

    let webhook_url = match telegram.get_webhook_info().await {
        Ok(info) => {
            info!("pending updates: {}", info.pending_update_count);
            if let Some(message) = info.last_error_message {
                warn!("last webhook error: {}", message);
            }
            match info.url {
                Some(url) => {
                    info!("webhook is set to {}", url.as_str().replace(token, "<token>"));
                    Some(url.to_string())
                },
                None => {
                    warn!("webhook is not set, updates can only be polled");
                    None
                }
            }
        },
        Err(e) => {
            error!("failed to get webhook info: {}", e);
            None
        }
    };

    if let Some(url) = webhook_url {
        check_host(&webhook_base(&url, token)).await;
    }
}

/// Registers the webhook at the public url and reads it back to verify it
///
/// # Arguments
///
/// * 'telegram' - Telegram client
/// * 'token' - the bot token
/// * 'public_url' - public host (with or without scheme) the webhook server is reached at
/// * 'secret' - optional webhook secret token
pub async fn register_webhook(telegram: &Telegram, token: &str, public_url: &str, secret: Option<&str>)
    -> Result<(), UnrecoverableError> {
    let url = webhook_url(public_url, token);
    let masked = url.replace(token, "<token>");

    telegram.set_webhook(&url, secret).await?;

    let registered = telegram.get_webhook_info().await?
        .url
        .map(|u| u.to_string())
        .unwrap_or_default();
    if registered != url {
        return Err(UnrecoverableError(format!("webhook mismatch, expected {} but Telegram has {}",
                                              masked, registered.replace(token, "<token>"))));
    }

    info!("webhook set to {}", masked);
    Ok(())
}

/// Webhook url for a public host, https unless a scheme is given
///
/// # Arguments
///
/// * 'public_url' - public host, e.g. meghdoot.up.railway.app
/// * 'token' - the bot token
pub fn webhook_url(public_url: &str, token: &str) -> String {
    let base = public_url.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/{}", base, token)
    } else {
        format!("https://{}/{}", base, token)
    }
}

async fn check_host(base_url: &str) {
    let client = match Client::builder().timeout(Duration::from_secs(10)).build() {
        Ok(client) => client,
        Err(e) => {
            error!("failed to create http client: {}", e);
            return;
        }
    };

    match client.get(base_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body = resp.text().await.unwrap_or_default();
            info!("{} is responding: {}", base_url, body.chars().take(100).collect::<String>());
        },
        Ok(resp) => error!("{} returned status {}", base_url, resp.status()),
        Err(e) => error!("cannot reach {}: {}", base_url, e),
    }
}

fn webhook_base(url: &str, token: &str) -> String {
    url.split(&format!("/{}", token))
        .next()
        .unwrap_or(url)
        .to_string()
}

/// First 10 and last 5 characters of the token
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 15 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{}...{}", head, tail)
}
