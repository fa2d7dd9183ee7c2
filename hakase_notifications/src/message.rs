use std::time::Duration;

use hakase_models::{assignment::Assignment, chrono_tz::Tz, course::Course};

use crate::intent::StudySessionNotification;

#[derive(Debug, Clone, Copy)]
pub enum NotificationMessage<'a> {
    AssignmentDue {
        assignment: &'a Assignment,
        course: &'a Course,
        lead_time: Duration,
    },
    SchedulingFailed {
        assignment: &'a Assignment,
    },
    StudySession {
        session: &'a StudySessionNotification,
        course: &'a Course,
    },
}

#[derive(Debug, Clone)]
pub struct MessageRenderer {
    timezone: Tz,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl MessageRenderer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn render(&self, message: NotificationMessage<'_>) -> String {
        match message {
            NotificationMessage::AssignmentDue {
                assignment,
                course,
                lead_time,
            } => {
                let due = assignment
                    .due
                    .with_timezone(&self.timezone)
                    .format("%Y-%m-%d %H:%M %Z");
                let mut text = format!(
                    "{}**[assignment notification]** assignment: {} is due in {}!\ndue: {}",
                    mention(course),
                    assignment.name,
                    format_lead_time(lead_time),
                    due
                );
                if let Some(link) = assignment.link() {
                    text.push('\n');
                    text.push_str(link);
                }
                text
            }
            NotificationMessage::SchedulingFailed { assignment } => format!(
                "**[assignment notification error]** failed to schedule assignment notifications for assignment: {}",
                assignment.name
            ),
            NotificationMessage::StudySession { session, course } => format!(
                "{}**[study session notification]** study session {} is starting now!",
                mention(course),
                session.session_id
            ),
        }
    }
}

fn mention(course: &Course) -> String {
    course
        .notify_group()
        .map(|group| format!("<@&{}> ", group))
        .unwrap_or_default()
}

pub fn format_lead_time(lead_time: Duration) -> String {
    let secs = lead_time.as_secs();
    let (amount, unit) = if secs == 0 {
        (0, "second")
    } else if secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}
