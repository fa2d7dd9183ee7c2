use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::course::CourseId;

pub type AssignmentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, skip_serializing_if = "is_unset")]
    pub id: AssignmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub course_id: CourseId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub due: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
}

fn is_unset(id: &AssignmentId) -> bool {
    *id == 0
}

impl Assignment {
    pub fn link(&self) -> Option<&str> {
        Some(self.link.as_str()).filter(|link| !link.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn deserializes_backend_payload() {
        let assignment: Assignment = serde_json::from_str(
            r#"{"id": 42, "course": 3, "course_id": "1234", "name": "lab 1", "due": "2025-09-01T23:59:00Z", "link": ""}"#,
        )
        .unwrap();

        assert_eq!(assignment.id, 42);
        assert_eq!(assignment.course_id, "1234");
        assert_eq!(
            assignment.due,
            Utc.with_ymd_and_hms(2025, 9, 1, 23, 59, 0).unwrap()
        );
        assert_eq!(assignment.link(), None);
    }

    #[test]
    fn new_assignment_is_serialized_without_id() {
        let assignment = Assignment {
            id: 0,
            course: None,
            course_id: "1234".to_owned(),
            name: "lab 1".to_owned(),
            due: Utc.with_ymd_and_hms(2025, 9, 1, 23, 59, 0).unwrap(),
            link: "https://example.com/lab1".to_owned(),
        };

        let json = serde_json::to_value(&assignment).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["link"], "https://example.com/lab1");
    }
}
