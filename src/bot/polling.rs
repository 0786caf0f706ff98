//! Long-polling update loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::bot::dispatcher::Dispatcher;
use crate::lifecycle::Lifecycle;
use crate::telegram::TelegramClient;

/// Pause after a failed getUpdates call, unless the API asks for a different wait.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// How long in-flight handlers may keep running once the loop stops.
const HANDLER_GRACE: Duration = Duration::from_secs(30);

/// Poll for updates and dispatch each message on its own task until the
/// lifecycle stops.
///
/// On exit the last offset is acknowledged, so a `/r` that triggered a
/// restart is not delivered again to the new process.
pub async fn run_polling(
    client: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    lifecycle: Lifecycle,
    poll_timeout_secs: u64,
) {
    info!("Polling for updates");
    let mut offset: Option<i64> = None;
    let mut handlers = JoinSet::new();

    while lifecycle.requested().is_none() {
        let result = tokio::select! {
            result = client.get_updates(offset, poll_timeout_secs) => result,
            _ = lifecycle.stopped() => break,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Some(message) = update.message {
                        let dispatcher = Arc::clone(&dispatcher);
                        handlers.spawn(async move { dispatcher.handle_message(&message).await });
                    }
                }
            }
            Err(e) => {
                let pause = e.retry_after().unwrap_or(RETRY_DELAY);
                warn!("getUpdates failed, retrying in {:?}: {}", pause, e);
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = lifecycle.stopped() => break,
                }
            }
        }

        while handlers.try_join_next().is_some() {}
    }

    if let Some(offset) = offset {
        if let Err(e) = client.get_updates(Some(offset), 0).await {
            warn!("Failed to acknowledge updates up to {}: {}", offset, e);
        }
    }

    let drain = async { while handlers.join_next().await.is_some() {} };
    if tokio::time::timeout(HANDLER_GRACE, drain).await.is_err() {
        warn!("Abandoning message handlers still running after {:?}", HANDLER_GRACE);
    }

    info!("Polling stopped");
}
