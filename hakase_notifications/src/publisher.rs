use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    channel::Subject,
    intent::{ReminderIntent, StudySessionNotification},
    pool::{ConnectionPool, Connector},
};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to publish message to subject: {subject}")]
    Transport {
        subject: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PublishError {
    fn transport(subject: String, error: anyhow::Error) -> Self {
        PublishError::Transport {
            subject,
            source: error.into(),
        }
    }
}

/// A connection able to durably enqueue one message.
#[async_trait]
pub trait PublishConnection: Send + Sync + 'static {
    async fn publish(&self, subject: String, payload: Vec<u8>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ReminderPublisher: Send + Sync + 'static {
    async fn publish_notification(&self, notification: &str) -> Result<(), PublishError>;

    async fn publish_assignment_notification(
        &self,
        intent: &ReminderIntent,
    ) -> Result<(), PublishError>;

    async fn publish_study_session_notification(
        &self,
        notification: &StudySessionNotification,
    ) -> Result<(), PublishError>;
}

pub struct NotificationPublisher<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
    stream_name: String,
}

impl<C> NotificationPublisher<C>
where
    C: Connector,
    C::Connection: PublishConnection,
{
    pub fn new(pool: Arc<ConnectionPool<C>>, stream_name: impl Into<String>) -> Self {
        Self {
            pool,
            stream_name: stream_name.into(),
        }
    }

    async fn publish_message(&self, subject: Subject, payload: Vec<u8>) -> Result<(), PublishError> {
        let subject = subject.in_stream(&self.stream_name);
        log::debug!("Publishing message to subject: {subject}");

        let connection = match self.pool.get().await {
            Ok(connection) => connection,
            Err(error) => return Err(PublishError::transport(subject, error)),
        };

        let result = connection.publish(subject.clone(), payload).await;
        match result {
            Ok(()) => Ok(()),
            Err(error) => {
                connection.discard();
                Err(PublishError::transport(subject, error))
            }
        }
    }
}

fn logged<T>(result: Result<T, PublishError>, what: &str) -> Result<T, PublishError> {
    if let Err(error) = &result {
        log::error!("Error publishing {what}. [error = {error}]");
    }
    result
}

#[async_trait]
impl<C> ReminderPublisher for NotificationPublisher<C>
where
    C: Connector,
    C::Connection: PublishConnection,
{
    async fn publish_notification(&self, notification: &str) -> Result<(), PublishError> {
        let result = self
            .publish_message(Subject::Notifications, notification.as_bytes().to_vec())
            .await;

        logged(result, "notification")
    }

    async fn publish_assignment_notification(
        &self,
        intent: &ReminderIntent,
    ) -> Result<(), PublishError> {
        let result = match intent.encode() {
            Ok(payload) => self.publish_message(Subject::Assignments, payload).await,
            Err(error) => Err(error.into()),
        };

        logged(result, "assignment notification").inspect(|_| {
            log::info!(
                "Published assignment notification. [assignment_id = {}, course_id = {}, lead_time = {:?}]",
                intent.assignment_id(),
                intent.course_id(),
                intent.lead_time()
            )
        })
    }

    async fn publish_study_session_notification(
        &self,
        notification: &StudySessionNotification,
    ) -> Result<(), PublishError> {
        let result = match notification.encode() {
            Ok(payload) => self.publish_message(Subject::StudySessions, payload).await,
            Err(error) => Err(error.into()),
        };

        logged(result, "study session notification")
    }
}
