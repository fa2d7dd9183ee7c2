//! NATS JetStream implementations of the channel, connector and listener.

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::Context as _;
use async_nats::jetstream::{
    self, AckKind,
    consumer::{AckPolicy, pull},
    stream,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{InboundMessage, stream_subjects},
    dispatcher::NotificationDispatcher,
    listener::consume_when_ready,
    pool::Connector,
    publisher::PublishConnection,
};

/// Upper bound for connecting and setting up the stream and consumer.
const SETUP_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
impl InboundMessage for jetstream::Message {
    fn subject(&self) -> &str {
        self.subject.as_str()
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(&self) -> anyhow::Result<()> {
        jetstream::Message::ack(self)
            .await
            .map_err(|error| anyhow::anyhow!(error))
    }

    async fn nak_with_delay(&self, delay: Duration) -> anyhow::Result<()> {
        self.ack_with(AckKind::Nak(Some(delay)))
            .await
            .map_err(|error| anyhow::anyhow!(error))
    }
}

pub struct JetStreamConnection {
    client: async_nats::Client,
    context: jetstream::Context,
}

#[async_trait]
impl PublishConnection for JetStreamConnection {
    async fn publish(&self, subject: String, payload: Vec<u8>) -> anyhow::Result<()> {
        self.context
            .publish(subject, payload.into())
            .await?
            .await?;

        Ok(())
    }
}

/// Opens publisher connections for the pool.
pub struct JetStreamConnector {
    url: String,
}

impl JetStreamConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for JetStreamConnector {
    type Connection = JetStreamConnection;

    async fn connect(&self) -> anyhow::Result<JetStreamConnection> {
        log::debug!("Opening NATS publisher connection. [url = {}]", self.url);
        let client = async_nats::connect(&self.url)
            .await
            .with_context(|| format!("Error connecting to NATS: {}", self.url))?;
        let context = jetstream::new(client.clone());

        Ok(JetStreamConnection { client, context })
    }

    async fn close(&self, connection: JetStreamConnection) -> anyhow::Result<()> {
        log::debug!("Draining NATS publisher connection. [url = {}]", self.url);
        connection.client.drain().await?;
        Ok(())
    }
}

pub struct JetStreamListener {
    url: String,
    stream_name: String,
    ack_wait: Duration,
    grace: Duration,
}

impl JetStreamListener {
    pub fn new(
        url: impl Into<String>,
        stream_name: impl Into<String>,
        ack_wait: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            stream_name: stream_name.into(),
            ack_wait,
            grace,
        }
    }

    /// Sets up the stream and its consumer, runs `on_ready`, then consumes
    /// until `shutdown` is cancelled and drains the connection.
    pub async fn listen(
        &self,
        dispatcher: Arc<NotificationDispatcher>,
        shutdown: CancellationToken,
        on_ready: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        log::info!("Opening NATS consumer connection. [url = {}]", self.url);

        let (client, consumer) = tokio::time::timeout(SETUP_TIMEOUT, self.setup())
            .await
            .context("Timed out setting up NATS consumer")??;

        let subscription = async {
            let messages = consumer
                .messages()
                .await
                .with_context(|| format!("Error subscribing to stream: {}", self.stream_name))?;
            log::info!("Listening to stream. [stream = {}]", self.stream_name);
            Ok::<_, anyhow::Error>(Box::pin(messages))
        };

        let result =
            consume_when_ready(subscription, on_ready, dispatcher, shutdown, self.grace).await;

        log::info!("Draining NATS consumer connection.");
        if let Err(error) = client.drain().await {
            log::error!("Error draining NATS connection. [error = {error}]");
        }

        result
    }

    async fn setup(
        &self,
    ) -> anyhow::Result<(async_nats::Client, jetstream::consumer::Consumer<pull::Config>)> {
        let client = async_nats::connect(&self.url)
            .await
            .with_context(|| format!("Error connecting to NATS: {}", self.url))?;
        let context = jetstream::new(client.clone());

        log::debug!("Creating stream. [stream = {}]", self.stream_name);
        let stream = context
            .get_or_create_stream(stream::Config {
                name: self.stream_name.clone(),
                subjects: vec![stream_subjects(&self.stream_name)],
                ..Default::default()
            })
            .await
            .with_context(|| format!("Error creating stream: {}", self.stream_name))?;

        let consumer = stream
            .get_or_create_consumer(
                &self.stream_name,
                pull::Config {
                    name: Some(self.stream_name.clone()),
                    durable_name: Some(self.stream_name.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: self.ack_wait,
                    ..Default::default()
                },
            )
            .await
            .with_context(|| format!("Error creating consumer for stream: {}", self.stream_name))?;

        Ok((client, consumer))
    }
}
