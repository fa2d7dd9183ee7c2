//! Assignment reminders scheduled through a durable stream.
//!
//! Intents are published once and consumed repeatedly: a message that
//! arrives before its reminder is due is negatively acknowledged with the
//! remaining wait, so the stream's redelivery delay does the timekeeping.

pub mod channel;
pub mod delivery;
pub mod dispatcher;
pub mod intent;
pub mod jetstream;
pub mod listener;
pub mod message;
pub mod policy;
pub mod pool;
pub mod publisher;
pub mod reminders;

#[cfg(test)]
mod test_utils;

pub use channel::{InboundMessage, Subject};
pub use delivery::NotificationSink;
pub use dispatcher::{MessageOutcome, NotificationDispatcher};
pub use intent::{IntentError, ReminderIntent, StudySessionNotification};
pub use jetstream::{JetStreamConnector, JetStreamListener};
pub use message::MessageRenderer;
pub use pool::{ConnectionPool, Connector};
pub use publisher::{NotificationPublisher, PublishError, ReminderPublisher};
pub use reminders::{AssignmentReminders, DueDateError};
