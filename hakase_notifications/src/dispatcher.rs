//! Turns one stream message into exactly one acknowledgement decision.
//!
//! Every notification message either reaches its channel and is acked,
//! is negatively acknowledged with a delay so the stream offers it again
//! later, or is left unacknowledged so the stream redelivers it after its
//! ack timeout. Messages that can never succeed are acked and dropped.

use std::{sync::Arc, time::Duration};

use hakase_backend::BackendClient;
use hakase_models::{
    chrono::{DateTime, Utc},
    course::Course,
};

use crate::{
    channel::{InboundMessage, Subject},
    delivery::NotificationSink,
    intent::{ReminderIntent, StudySessionNotification},
    message::{MessageRenderer, NotificationMessage},
    policy::{self, DELIVERY_RETRY_DELAY, DeliveryPlan},
};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Posted to the channel and acked.
    Delivered,
    /// Acked without delivery; the message could never succeed.
    Discarded,
    /// Operational notice, logged and acked.
    Logged,
    /// Arrived early, offered again after `delay`.
    Rescheduled { delay: Duration },
    /// Posting failed, offered again after `delay`.
    DeliveryRetry { delay: Duration },
    /// Left unacknowledged, the stream redelivers it after its ack timeout.
    AwaitingRedelivery,
    /// Could not be rescheduled; the channel was told, if possible.
    ScheduleFailed,
}

struct Delivery {
    channel_id: String,
    notify_at: DateTime<Utc>,
    text: String,
    fallback: Option<String>,
    context: String,
}

pub struct NotificationDispatcher {
    backend: Arc<dyn BackendClient>,
    sink: Arc<dyn NotificationSink>,
    stream_name: String,
    retry_delay: Duration,
    renderer: MessageRenderer,
}

impl NotificationDispatcher {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        sink: Arc<dyn NotificationSink>,
        stream_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            sink,
            stream_name: stream_name.into(),
            retry_delay: DELIVERY_RETRY_DELAY,
            renderer: MessageRenderer::default(),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_renderer(mut self, renderer: MessageRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub async fn consume_message(&self, message: &dyn InboundMessage) -> MessageOutcome {
        self.consume_message_at(message, Utc::now()).await
    }

    pub async fn consume_message_at(
        &self,
        message: &dyn InboundMessage,
        now: DateTime<Utc>,
    ) -> MessageOutcome {
        match Subject::parse(&self.stream_name, message.subject()) {
            Some(Subject::Assignments) => self.consume_assignment_notification(message, now).await,
            Some(Subject::StudySessions) => {
                self.consume_study_session_notification(message, now).await
            }
            Some(Subject::Notifications) => {
                log::info!(
                    "Received notification. [message = {}]",
                    String::from_utf8_lossy(message.payload())
                );
                acknowledge(message, MessageOutcome::Logged).await
            }
            None => {
                log::warn!(
                    "Received message on unknown subject, discarding. [subject = {}]",
                    message.subject()
                );
                acknowledge(message, MessageOutcome::Discarded).await
            }
        }
    }

    async fn consume_assignment_notification(
        &self,
        message: &dyn InboundMessage,
        now: DateTime<Utc>,
    ) -> MessageOutcome {
        let intent = match ReminderIntent::decode(message.payload()) {
            Ok(intent) => intent,
            Err(error) => {
                log::error!(
                    "Malformed assignment notification, discarding. [subject = {}, error = {}]",
                    message.subject(),
                    error
                );
                return acknowledge(message, MessageOutcome::Discarded).await;
            }
        };

        let context = format!(
            "assignment_id = {}, course_id = {}, lead_time = {:?}",
            intent.assignment_id(),
            intent.course_id(),
            intent.lead_time()
        );

        let assignment = match self.backend.read_assignment(intent.assignment_id()).await {
            Ok(assignment) => assignment,
            Err(error) => {
                log::error!("Error fetching assignment. [{context}, error = {error}]");
                return MessageOutcome::AwaitingRedelivery;
            }
        };

        let Some((course, channel_id)) = self.notify_target(intent.course_id(), &context).await
        else {
            return MessageOutcome::AwaitingRedelivery;
        };

        let delivery = Delivery {
            channel_id,
            notify_at: policy::notify_at(assignment.due, intent.lead_time()),
            text: self.renderer.render(NotificationMessage::AssignmentDue {
                assignment: &assignment,
                course: &course,
                lead_time: intent.lead_time(),
            }),
            fallback: Some(
                self.renderer
                    .render(NotificationMessage::SchedulingFailed {
                        assignment: &assignment,
                    }),
            ),
            context,
        };

        self.deliver_or_reschedule(message, delivery, now).await
    }

    async fn consume_study_session_notification(
        &self,
        message: &dyn InboundMessage,
        now: DateTime<Utc>,
    ) -> MessageOutcome {
        let session = match StudySessionNotification::decode(message.payload()) {
            Ok(session) => session,
            Err(error) => {
                log::error!(
                    "Malformed study session notification, discarding. [subject = {}, error = {}]",
                    message.subject(),
                    error
                );
                return acknowledge(message, MessageOutcome::Discarded).await;
            }
        };

        let context = format!(
            "session_id = {}, course_id = {}",
            session.session_id, session.course_id
        );

        let Some((course, channel_id)) = self.notify_target(&session.course_id, &context).await
        else {
            return MessageOutcome::AwaitingRedelivery;
        };

        let delivery = Delivery {
            channel_id,
            notify_at: session.timestamp,
            text: self.renderer.render(NotificationMessage::StudySession {
                session: &session,
                course: &course,
            }),
            fallback: None,
            context,
        };

        self.deliver_or_reschedule(message, delivery, now).await
    }

    /// Course and the channel its reminders go to.
    async fn notify_target(&self, course_id: &str, context: &str) -> Option<(Course, String)> {
        let course = match self.backend.read_course(course_id).await {
            Ok(course) => course,
            Err(error) => {
                log::error!("Error fetching course. [{context}, error = {error}]");
                return None;
            }
        };

        if let Some(channel_id) = course.notify_channel() {
            let channel_id = channel_id.to_owned();
            return Some((course, channel_id));
        }

        match self.sink.resolve_default_channel(&course.course_id).await {
            Ok(channel_id) => Some((course, channel_id)),
            Err(error) => {
                log::error!("Unable to resolve default notification channel. [{context}, error = {error}]");
                None
            }
        }
    }

    async fn deliver_or_reschedule(
        &self,
        message: &dyn InboundMessage,
        delivery: Delivery,
        now: DateTime<Utc>,
    ) -> MessageOutcome {
        let context = &delivery.context;

        match policy::plan_delivery(delivery.notify_at, now) {
            DeliveryPlan::DeliverNow => {
                match self.sink.send(&delivery.channel_id, &delivery.text).await {
                    Ok(()) => {
                        log::info!(
                            "Notification delivered. [{context}, channel_id = {}]",
                            delivery.channel_id
                        );
                        if let Err(error) = message.ack().await {
                            log::error!("Error acknowledging delivered notification, it may be delivered again. [{context}, error = {error}]");
                        }
                        MessageOutcome::Delivered
                    }
                    Err(error) => {
                        log::error!(
                            "Error delivering notification, retrying in {:?}. [{context}, channel_id = {}, error = {}]",
                            self.retry_delay,
                            delivery.channel_id,
                            error
                        );
                        if let Err(error) = message.nak_with_delay(self.retry_delay).await {
                            log::error!("Error rescheduling undelivered notification. [{context}, error = {error}]");
                        }
                        MessageOutcome::DeliveryRetry {
                            delay: self.retry_delay,
                        }
                    }
                }
            }
            DeliveryPlan::RescheduleIn(delay) => match message.nak_with_delay(delay).await {
                Ok(()) => {
                    log::info!(
                        "Notification rescheduled. [{context}, notify_at = {}, delay = {:?}]",
                        delivery.notify_at,
                        delay
                    );
                    MessageOutcome::Rescheduled { delay }
                }
                Err(error) => {
                    log::error!("Error rescheduling notification. [{context}, error = {error}]");
                    if let Some(fallback) = &delivery.fallback {
                        if let Err(error) = self.sink.send(&delivery.channel_id, fallback).await {
                            log::error!("Error reporting scheduling failure. [{context}, error = {error}]");
                        }
                    }
                    MessageOutcome::ScheduleFailed
                }
            },
        }
    }
}

async fn acknowledge(message: &dyn InboundMessage, outcome: MessageOutcome) -> MessageOutcome {
    if let Err(error) = message.ack().await {
        log::error!(
            "Error acknowledging message. [subject = {}, error = {}]",
            message.subject(),
            error
        );
    }
    outcome
}
