use serde::{Deserialize, Serialize};

/// Course identifiers are the id of the guild the course lives in.
pub type CourseId = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<i64>,
    pub course_id: CourseId,
    /// Channel reminders are posted to. Empty means the guild's system channel.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notify_channel: String,
    /// Role mentioned in reminders, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notify_group: String,
}

impl Course {
    pub fn new(course_id: impl Into<CourseId>) -> Self {
        Self {
            course_id: course_id.into(),
            ..Default::default()
        }
    }

    pub fn notify_channel(&self) -> Option<&str> {
        Some(self.notify_channel.as_str()).filter(|channel| !channel.is_empty())
    }

    pub fn notify_group(&self) -> Option<&str> {
        Some(self.notify_group.as_str()).filter(|group| !group.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_notify_fields_are_treated_as_unset() {
        let course: Course = serde_json::from_str(r#"{"course_id": "1234"}"#).unwrap();

        assert_eq!(course.notify_channel(), None);
        assert_eq!(course.notify_group(), None);
    }

    #[test]
    fn unset_fields_are_omitted_when_serialized() {
        let json = serde_json::to_value(Course::new("1234")).unwrap();

        assert_eq!(json, serde_json::json!({ "course_id": "1234" }));
    }
}
