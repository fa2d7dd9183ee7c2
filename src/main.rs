mod appsettings;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use hakase_backend::HttpBackendClient;
use hakase_discord::{DiscordNotificationSink, serenity::http::Http};
use hakase_notifications::{
    AssignmentReminders, ConnectionPool, JetStreamConnector, JetStreamListener, MessageRenderer,
    NotificationDispatcher, NotificationPublisher, ReminderPublisher,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let settings = appsettings::load().context("Error loading settings")?;
    let nats = &settings.nats;

    let timezone: Tz = settings
        .notifications
        .timezone
        .parse()
        .map_err(|error| anyhow::anyhow!("Unknown timezone {}: {}", settings.notifications.timezone, error))?;

    let backend = Arc::new(HttpBackendClient::new(
        &settings.backend.url,
        &settings.backend.api_key,
    ));
    let sink = Arc::new(DiscordNotificationSink::new(Arc::new(Http::new(
        &settings.discord.token,
    ))));

    let dispatcher = NotificationDispatcher::new(backend, sink.clone(), &nats.stream_name)
        .with_retry_delay(Duration::from_secs(settings.notifications.retry_delay_secs))
        .with_renderer(MessageRenderer::new(timezone));

    let pool = Arc::new(ConnectionPool::new(
        JetStreamConnector::new(&nats.url),
        nats.max_idle_publishers,
    ));
    let publisher: Arc<dyn ReminderPublisher> = Arc::new(NotificationPublisher::new(
        Arc::clone(&pool),
        &nats.stream_name,
    ));
    let reminders = AssignmentReminders::new(
        Arc::clone(&publisher),
        settings.notifications.lead_times(),
    );
    log::info!(
        "Assignment reminders configured. [lead_times = {:?}]",
        reminders.lead_times()
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let listener = JetStreamListener::new(
        &nats.url,
        &nats.stream_name,
        Duration::from_secs(nats.ack_wait_secs),
        Duration::from_secs(nats.shutdown_grace_secs),
    );
    let result = listener
        .listen(
            Arc::new(dispatcher),
            shutdown,
            announce_login(&sink, publisher.as_ref()),
        )
        .await;

    log::info!("Closing publisher connections.");
    pool.close().await;

    result
}

async fn announce_login(sink: &DiscordNotificationSink, publisher: &dyn ReminderPublisher) {
    match sink.current_user_tag().await {
        Ok(tag) => {
            log::info!("Logged in. [user = {tag}]");
            let _ = publisher
                .publish_notification(&format!("logged in as {tag}"))
                .await;
        }
        Err(error) => log::error!("Error fetching bot user. [error = {error}]"),
    }
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    match wait_for_signal().await {
        Ok(()) => log::info!("Shutdown signal received."),
        Err(error) => log::error!("Error listening for shutdown signal. [error = {error}]"),
    }
    shutdown.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
