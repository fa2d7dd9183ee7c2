use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hakase_models::{
    assignment::AssignmentId,
    chrono::{DateTime, Utc},
    course::CourseId,
};

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("assignment id must be positive, got {0}")]
    InvalidAssignmentId(AssignmentId),

    #[error("course id is empty")]
    MissingCourseId,
}

/// One reminder for one assignment, fired `lead_time` before it is due.
///
/// The stream is the only store of an intent: it lives for as long as the
/// message carrying it stays unacknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderIntent {
    #[serde(rename = "AssignmentID")]
    assignment_id: AssignmentId,
    #[serde(rename = "CourseID")]
    course_id: CourseId,
    #[serde(rename = "Before", with = "nanoseconds")]
    lead_time: Duration,
}

impl ReminderIntent {
    pub fn new(
        assignment_id: AssignmentId,
        course_id: impl Into<CourseId>,
        lead_time: Duration,
    ) -> Result<Self, IntentError> {
        let intent = Self {
            assignment_id,
            course_id: course_id.into(),
            lead_time,
        };

        intent.validate()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, IntentError> {
        let intent: Self = serde_json::from_slice(payload)?;
        intent.validate()
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn assignment_id(&self) -> AssignmentId {
        self.assignment_id
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn lead_time(&self) -> Duration {
        self.lead_time
    }

    fn validate(self) -> Result<Self, IntentError> {
        if self.assignment_id <= 0 {
            return Err(IntentError::InvalidAssignmentId(self.assignment_id));
        }
        if self.course_id.is_empty() {
            return Err(IntentError::MissingCourseId);
        }

        Ok(self)
    }
}

/// Study session reminder, fired at `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySessionNotification {
    #[serde(rename = "SessionID")]
    pub session_id: i64,
    #[serde(rename = "CourseID")]
    pub course_id: CourseId,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl StudySessionNotification {
    pub fn decode(payload: &[u8]) -> Result<Self, IntentError> {
        let notification: Self = serde_json::from_slice(payload)?;
        if notification.course_id.is_empty() {
            return Err(IntentError::MissingCourseId);
        }

        Ok(notification)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Lead times travel as integer nanoseconds.
mod nanoseconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, ser::Error};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(duration.as_nanos())
            .map_err(|_| S::Error::custom("lead time does not fit in 64 bits of nanoseconds"))?;
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn encodes_lead_time_as_nanoseconds() {
        let intent = ReminderIntent::new(42, "g1", DAY).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&intent.encode().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "AssignmentID": 42,
                "CourseID": "g1",
                "Before": 86_400_000_000_000u64
            })
        );
    }

    #[test]
    fn decodes_payload_published_by_older_producers() {
        let intent =
            ReminderIntent::decode(br#"{"AssignmentID":7,"CourseID":"1234","Before":3600000000000}"#)
                .unwrap();

        assert_eq!(intent.assignment_id(), 7);
        assert_eq!(intent.course_id(), "1234");
        assert_eq!(intent.lead_time(), Duration::from_secs(3600));
    }

    #[test]
    fn missing_course_id_is_malformed() {
        let result = ReminderIntent::decode(br#"{"AssignmentID":7,"Before":3600000000000}"#);

        assert!(matches!(result, Err(IntentError::Malformed(_))), "result = {result:?}");
    }

    #[test]
    fn empty_course_id_is_rejected() {
        let result = ReminderIntent::decode(br#"{"AssignmentID":7,"CourseID":"","Before":0}"#);

        assert!(matches!(result, Err(IntentError::MissingCourseId)), "result = {result:?}");
    }

    #[test]
    fn negative_lead_time_is_malformed() {
        let result = ReminderIntent::decode(br#"{"AssignmentID":7,"CourseID":"g1","Before":-5}"#);

        assert!(matches!(result, Err(IntentError::Malformed(_))), "result = {result:?}");
    }

    #[test]
    fn unset_assignment_id_is_rejected() {
        let result = ReminderIntent::new(0, "g1", DAY);

        assert!(
            matches!(result, Err(IntentError::InvalidAssignmentId(0))),
            "result = {result:?}"
        );
    }

    #[test]
    fn corrupt_bytes_are_malformed() {
        let result = ReminderIntent::decode(&[0xde, 0xad, 0xbe, 0xef]);

        assert!(matches!(result, Err(IntentError::Malformed(_))));
    }

    #[test]
    fn study_session_timestamp_is_rfc3339() {
        let notification = StudySessionNotification::decode(
            br#"{"SessionID":3,"CourseID":"g1","Timestamp":"2025-09-01T18:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(notification.session_id, 3);
        assert_eq!(notification.timestamp.to_rfc3339(), "2025-09-01T18:00:00+00:00");
    }
}
