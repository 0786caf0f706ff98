//! Application wiring.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::AdminList;
use crate::bot::{run_polling, Dispatcher};
use crate::config::Config;
use crate::delivery::{FanoutDelivery, MessageTransport};
use crate::feed::RssFetcher;
use crate::lifecycle::{Exit, Lifecycle};
use crate::relay::NewsRelay;
use crate::scheduler::{run_schedule, Schedule};
use crate::subscriber::{SubscriberRegistry, SubscriberStore};
use crate::telegram::TelegramClient;
use crate::Result;

/// How long the scheduler and poller get to finish once a stop is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Run the bot until a shutdown or restart is requested.
pub async fn run(config: Config) -> Result<Exit> {
    config.validate()?;
    let token = config.bot_token()?;
    let admins = AdminList::new(config.admin_ids()?);
    if admins.is_empty() {
        warn!("No administrators configured; admin commands are disabled");
    }
    let schedule = Schedule::from_config(&config.schedule)?;

    let store = SubscriberStore::new(&config.storage.subscribers_file);
    let registry = Arc::new(SubscriberRegistry::open(store).await?);

    let client = Arc::new(TelegramClient::new(&config.telegram, &token)?);
    let me = client.get_me().await?;
    info!(
        "Connected as @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let transport: Arc<dyn MessageTransport> = client.clone();
    let delivery = FanoutDelivery::from_config(Arc::clone(&transport), &config.delivery);
    let fetcher = Arc::new(RssFetcher::new(&config.feeds)?);
    let relay = Arc::new(
        NewsRelay::new(registry, fetcher, delivery, admins.clone()).configured(&config),
    );

    let lifecycle = Lifecycle::new();
    lifecycle.shutdown_on_ctrl_c();

    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&relay), transport, admins, lifecycle.clone())
            .with_bot_username(me.username.clone())
            .with_topic(config.telegram.topic.clone()),
    );

    let scheduler = tokio::spawn(run_schedule(relay, schedule, lifecycle.clone()));
    let poller = tokio::spawn(run_polling(
        client,
        dispatcher,
        lifecycle.clone(),
        config.telegram.poll_timeout_secs,
    ));

    let exit = lifecycle.stopped().await;
    info!("Stopping ({:?})", exit);

    let join = async {
        if let Err(e) = scheduler.await {
            warn!("Scheduler task failed: {}", e);
        }
        if let Err(e) = poller.await {
            warn!("Polling task failed: {}", e);
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, join).await.is_err() {
        warn!("Tasks still running after {:?}, exiting anyway", SHUTDOWN_GRACE);
    }

    Ok(exit)
}
