use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use hakase_backend::{BackendClient, BackendError};
use hakase_models::{
    assignment::{Assignment, AssignmentId},
    chrono::{DateTime, Utc},
    course::Course,
};

use crate::{
    channel::InboundMessage,
    delivery::NotificationSink,
    intent::{ReminderIntent, StudySessionNotification},
    publisher::{PublishError, ReminderPublisher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Ack,
    Nak(Duration),
}

pub struct TestMessage {
    subject: String,
    payload: Vec<u8>,
    acknowledgements: Arc<Mutex<Vec<Acknowledgement>>>,
    failing_nak: bool,
}

impl TestMessage {
    pub fn new(subject: &str, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.to_owned(),
            payload: payload.into(),
            acknowledgements: Arc::new(Mutex::new(Vec::new())),
            failing_nak: false,
        }
    }

    pub fn intent(intent: &ReminderIntent) -> Self {
        Self::new("hakase.assignments", intent.encode().unwrap())
    }

    pub fn with_failing_nak(mut self) -> Self {
        self.failing_nak = true;
        self
    }

    pub fn acknowledgements(&self) -> Vec<Acknowledgement> {
        self.acknowledgements.lock().unwrap().clone()
    }

    pub fn acknowledgements_handle(&self) -> Arc<Mutex<Vec<Acknowledgement>>> {
        Arc::clone(&self.acknowledgements)
    }
}

#[async_trait]
impl InboundMessage for TestMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(&self) -> anyhow::Result<()> {
        self.acknowledgements
            .lock()
            .unwrap()
            .push(Acknowledgement::Ack);
        Ok(())
    }

    async fn nak_with_delay(&self, delay: Duration) -> anyhow::Result<()> {
        if self.failing_nak {
            anyhow::bail!("stream unavailable");
        }
        self.acknowledgements
            .lock()
            .unwrap()
            .push(Acknowledgement::Nak(delay));
        Ok(())
    }
}

#[derive(Default)]
pub struct StubBackend {
    assignments: Mutex<HashMap<AssignmentId, Assignment>>,
    courses: Mutex<HashMap<String, Course>>,
    unavailable: AtomicBool,
}

impl StubBackend {
    pub fn with_assignment(self, assignment: Assignment) -> Self {
        self.assignments
            .lock()
            .unwrap()
            .insert(assignment.id, assignment);
        self
    }

    pub fn with_course(self, course: Course) -> Self {
        self.courses
            .lock()
            .unwrap()
            .insert(course.course_id.clone(), course);
        self
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::UnexpectedStatus {
                method: reqwest::Method::GET,
                resource: "assignments",
                status: 503,
            });
        }
        Ok(())
    }
}

fn not_found(resource: &'static str, id: impl ToString) -> BackendError {
    BackendError::NotFound {
        resource,
        id: id.to_string(),
    }
}

#[async_trait]
impl BackendClient for StubBackend {
    async fn read_course(&self, course_id: &str) -> Result<Course, BackendError> {
        self.check_available()?;
        self.courses
            .lock()
            .unwrap()
            .get(course_id)
            .cloned()
            .ok_or_else(|| not_found("courses", course_id))
    }

    async fn head_course(&self, course_id: &str) -> Result<(), BackendError> {
        self.read_course(course_id).await.map(|_| ())
    }

    async fn create_course(&self, course: &Course) -> Result<Course, BackendError> {
        self.check_available()?;
        self.courses
            .lock()
            .unwrap()
            .insert(course.course_id.clone(), course.clone());
        Ok(course.clone())
    }

    async fn update_course(&self, course: &Course) -> Result<Course, BackendError> {
        self.create_course(course).await
    }

    async fn delete_course(&self, course_id: &str) -> Result<(), BackendError> {
        self.check_available()?;
        self.courses
            .lock()
            .unwrap()
            .remove(course_id)
            .map(|_| ())
            .ok_or_else(|| not_found("courses", course_id))
    }

    async fn read_assignment(&self, id: AssignmentId) -> Result<Assignment, BackendError> {
        self.check_available()?;
        self.assignments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("assignments", id))
    }

    async fn head_assignment(&self, id: AssignmentId) -> Result<(), BackendError> {
        self.read_assignment(id).await.map(|_| ())
    }

    async fn list_assignments(&self, course_id: &str) -> Result<Vec<Assignment>, BackendError> {
        self.check_available()?;
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .values()
            .filter(|assignment| assignment.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment, BackendError> {
        self.check_available()?;
        let mut assignments = self.assignments.lock().unwrap();
        let mut created = assignment.clone();
        created.id = assignments.keys().max().copied().unwrap_or(0) + 1;
        assignments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment, BackendError> {
        self.check_available()?;
        self.assignments
            .lock()
            .unwrap()
            .insert(assignment.id, assignment.clone());
        Ok(assignment.clone())
    }

    async fn delete_assignment(&self, id: AssignmentId) -> Result<(), BackendError> {
        self.check_available()?;
        self.assignments
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("assignments", id))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
    default_channels: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn with_default_channel(self, guild_id: &str, channel_id: &str) -> Self {
        self.default_channels
            .lock()
            .unwrap()
            .insert(guild_id.to_owned(), channel_id.to_owned());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, channel_id: &str, text: &str) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("discord is having a bad day");
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_owned(), text.to_owned()));
        Ok(())
    }

    async fn resolve_default_channel(&self, guild_id: &str) -> anyhow::Result<String> {
        self.default_channels
            .lock()
            .unwrap()
            .get(guild_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("guild {guild_id} has no system channel"))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    intents: Mutex<Vec<ReminderIntent>>,
    failing_lead_times: Mutex<HashSet<Duration>>,
}

impl RecordingPublisher {
    pub fn fail_for(&self, lead_time: Duration) {
        self.failing_lead_times.lock().unwrap().insert(lead_time);
    }

    pub fn intents(&self) -> Vec<ReminderIntent> {
        self.intents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderPublisher for RecordingPublisher {
    async fn publish_notification(&self, _notification: &str) -> Result<(), PublishError> {
        Ok(())
    }

    async fn publish_assignment_notification(
        &self,
        intent: &ReminderIntent,
    ) -> Result<(), PublishError> {
        if self
            .failing_lead_times
            .lock()
            .unwrap()
            .contains(&intent.lead_time())
        {
            return Err(PublishError::Transport {
                subject: "hakase.assignments".to_owned(),
                source: "no responders".into(),
            });
        }
        self.intents.lock().unwrap().push(intent.clone());
        Ok(())
    }

    async fn publish_study_session_notification(
        &self,
        _notification: &StudySessionNotification,
    ) -> Result<(), PublishError> {
        Ok(())
    }
}

pub fn assignment_due(id: AssignmentId, course_id: &str, due: DateTime<Utc>) -> Assignment {
    Assignment {
        id,
        course: None,
        course_id: course_id.to_owned(),
        name: format!("assignment {id}"),
        due,
        link: String::new(),
    }
}

pub fn course_with_channel(course_id: &str, notify_channel: &str) -> Course {
    let mut course = Course::new(course_id);
    course.notify_channel = notify_channel.to_owned();
    course
}
