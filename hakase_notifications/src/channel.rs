use std::time::Duration;

use async_trait::async_trait;

/// Message handed out by the durable stream. It stays owned by the stream
/// until it is acknowledged; a negative acknowledgement with a delay asks the
/// stream to offer it again no sooner than that delay.
#[async_trait]
pub trait InboundMessage: Send + Sync {
    fn subject(&self) -> &str;
    fn payload(&self) -> &[u8];

    async fn ack(&self) -> anyhow::Result<()>;
    async fn nak_with_delay(&self, delay: Duration) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Notifications,
    Assignments,
    StudySessions,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Notifications => "notifications",
            Subject::Assignments => "assignments",
            Subject::StudySessions => "study_sessions",
        }
    }

    /// Full subject name inside the stream, `<stream>.<kind>`.
    pub fn in_stream(&self, stream_name: &str) -> String {
        format!("{}.{}", stream_name, self.as_str())
    }

    pub fn parse(stream_name: &str, subject: &str) -> Option<Self> {
        let kind = subject
            .strip_prefix(stream_name)
            .and_then(|rest| rest.strip_prefix('.'))?;

        [
            Subject::Notifications,
            Subject::Assignments,
            Subject::StudySessions,
        ]
        .into_iter()
        .find(|subject| subject.as_str() == kind)
    }
}

/// Wildcard covering every subject of the stream.
pub fn stream_subjects(stream_name: &str) -> String {
    format!("{}.*", stream_name)
}
