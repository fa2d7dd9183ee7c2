use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use futures::{Stream, StreamExt};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{channel::InboundMessage, dispatcher::NotificationDispatcher};

/// Pulls messages until `shutdown` is cancelled or the stream ends, handling
/// each one in its own task.
///
/// After the last pull, in-flight handlers get `grace` to finish. Whatever
/// is still running then is aborted; its messages were never acknowledged,
/// so the stream hands them out again once their ack wait expires.
pub async fn run_consumer_loop<S, M, E>(
    mut messages: S,
    dispatcher: Arc<NotificationDispatcher>,
    shutdown: CancellationToken,
    grace: Duration,
) where
    S: Stream<Item = Result<M, E>> + Unpin,
    M: InboundMessage + 'static,
    E: Display,
{
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                log::info!("Shutdown requested, no longer pulling messages.");
                break;
            }
            next = messages.next() => match next {
                Some(Ok(message)) => {
                    let dispatcher = Arc::clone(&dispatcher);
                    in_flight.spawn(async move {
                        let outcome = dispatcher.consume_message(&message).await;
                        log::debug!(
                            "Message handled. [subject = {}, outcome = {:?}]",
                            message.subject(),
                            outcome
                        );
                    });
                }
                Some(Err(error)) => {
                    log::error!("Error receiving message. [error = {error}]");
                }
                None => {
                    log::warn!("Message stream ended.");
                    break;
                }
            },
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join_result(result);
            }
        }
    }

    wait_for_in_flight(in_flight, grace).await;
}

/// Waits for `subscription`, runs `on_ready` once it is in place, then
/// consumes it with [`run_consumer_loop`]. A failed subscription skips
/// `on_ready`.
pub async fn consume_when_ready<S, M, E>(
    subscription: impl Future<Output = anyhow::Result<S>>,
    on_ready: impl Future<Output = ()>,
    dispatcher: Arc<NotificationDispatcher>,
    shutdown: CancellationToken,
    grace: Duration,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<M, E>> + Unpin,
    M: InboundMessage + 'static,
    E: Display,
{
    let messages = subscription.await?;
    on_ready.await;
    run_consumer_loop(messages, dispatcher, shutdown, grace).await;
    Ok(())
}

async fn wait_for_in_flight(mut in_flight: JoinSet<()>, grace: Duration) {
    if in_flight.is_empty() {
        return;
    }

    log::info!(
        "Waiting for in-flight messages. [count = {}, grace = {:?}]",
        in_flight.len(),
        grace
    );

    let drained = tokio::time::timeout(grace, async {
        while let Some(result) = in_flight.join_next().await {
            log_join_result(result);
        }
    })
    .await;

    if drained.is_err() {
        log::warn!(
            "Abandoning in-flight messages to redelivery. [count = {}]",
            in_flight.len()
        );
        in_flight.shutdown().await;
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(error) = result {
        if error.is_panic() {
            log::error!("Message handler panicked. [error = {error}]");
        }
    }
}
