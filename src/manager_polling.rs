use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use log::{debug, error, info};
use tokio::task::JoinSet;
use crate::bot::Bot;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long polling loop, runs until Ctrl+C
///
/// Any webhook is removed first since Telegram refuses `getUpdates` while one is set.
/// Every update is handled on its own task so a slow forecast does not hold up other chats.
///
/// # Arguments
///
/// * 'bot' - the bot to hand updates to
/// * 'poll_timeout' - how long each long poll may wait for updates
pub async fn run_polling(bot: Arc<Bot>, poll_timeout: Duration) {
    poll_until(bot, poll_timeout, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }).await
}

/// Polls until the shutdown future completes, then waits for updates in progress
/// and confirms the handled ones to Telegram.
///
/// # Arguments
///
/// * 'bot' - the bot to hand updates to
/// * 'poll_timeout' - how long each long poll may wait for updates
/// * 'shutdown' - completes when polling should stop
async fn poll_until(bot: Arc<Bot>, poll_timeout: Duration, shutdown: impl Future<Output = ()>) {
    if let Err(e) = bot.telegram().delete_webhook().await {
        error!("failed to delete webhook: {}", e);
    }

    info!("bot is polling for updates, press Ctrl+C to stop");

    tokio::pin!(shutdown);
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut offset: Option<i32> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            result = bot.telegram().get_updates(offset, poll_timeout) => match result {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(next_offset(offset, update.id.0));

                        let bot = bot.clone();
                        tasks.spawn(async move {
                            if let Err(e) = bot.handle_update(update).await {
                                error!("failed to handle update: {}", e);
                            }
                        });
                    }
                },
                Err(e) => {
                    error!("failed to get updates: {}", e);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {},
                    }
                }
            },
        }

        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                error!("update task failed: {}", e);
            }
        }
    }

    info!("shutting down, waiting for {} update(s) in progress", tasks.len());
    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            error!("update task failed: {}", e);
        }
    }

    if let Some(offset) = offset {
        match bot.telegram().get_updates(Some(offset), Duration::ZERO).await {
            Ok(_) => debug!("confirmed updates up to offset {}", offset),
            Err(e) => error!("failed to confirm handled updates: {}", e),
        }
    }
}

/// Offset confirming everything up to and including the given update
fn next_offset(offset: Option<i32>, update_id: u32) -> i32 {
    let next = i32::try_from(update_id).unwrap_or(i32::MAX).saturating_add(1);
    offset.map_or(next, |o| o.max(next))
}
