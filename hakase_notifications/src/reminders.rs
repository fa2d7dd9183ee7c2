use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::task::JoinHandle;

use hakase_models::{
    assignment::Assignment,
    chrono::{DateTime, Utc},
};

use crate::{intent::ReminderIntent, policy::notify_at, publisher::ReminderPublisher};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DueDateError {
    #[error("due date cannot move earlier: {current} -> {updated}")]
    MovedEarlier {
        current: DateTime<Utc>,
        updated: DateTime<Utc>,
    },
}

/// Enqueues reminder intents for assignments, one per configured lead time.
///
/// Publishing happens on spawned tasks so callers never wait on the stream.
pub struct AssignmentReminders {
    publisher: Arc<dyn ReminderPublisher>,
    lead_times: Vec<Duration>,
}

impl AssignmentReminders {
    pub fn new(publisher: Arc<dyn ReminderPublisher>, lead_times: Vec<Duration>) -> Self {
        Self {
            publisher,
            lead_times,
        }
    }

    pub fn lead_times(&self) -> &[Duration] {
        &self.lead_times
    }

    pub fn schedule(&self, assignment: &Assignment) -> Vec<JoinHandle<()>> {
        self.publish(assignment, self.lead_times.iter().copied())
    }

    /// Intents still pending in the stream pick up the new due date on their
    /// own, so only reminders that already fired under `current` and fall in
    /// the future under `updated` are published again.
    pub fn reschedule(
        &self,
        current: &Assignment,
        updated: &Assignment,
        now: DateTime<Utc>,
    ) -> Result<Vec<JoinHandle<()>>, DueDateError> {
        if updated.due < current.due {
            return Err(DueDateError::MovedEarlier {
                current: current.due,
                updated: updated.due,
            });
        }

        let refired = self.lead_times.iter().copied().filter(|&lead_time| {
            notify_at(current.due, lead_time) <= now && notify_at(updated.due, lead_time) > now
        });

        Ok(self.publish(updated, refired))
    }

    fn publish(
        &self,
        assignment: &Assignment,
        lead_times: impl Iterator<Item = Duration>,
    ) -> Vec<JoinHandle<()>> {
        lead_times
            .filter_map(|lead_time| {
                let intent =
                    match ReminderIntent::new(assignment.id, assignment.course_id.clone(), lead_time)
                    {
                        Ok(intent) => intent,
                        Err(error) => {
                            log::error!(
                                "Not scheduling reminder for invalid assignment. [assignment_id = {}, error = {}]",
                                assignment.id,
                                error
                            );
                            return None;
                        }
                    };

                let publisher = Arc::clone(&self.publisher);
                Some(tokio::spawn(async move {
                    if let Err(error) = publisher.publish_assignment_notification(&intent).await {
                        log::warn!(
                            "Reminder was not scheduled. [assignment_id = {}, lead_time = {:?}, error = {}]",
                            intent.assignment_id(),
                            intent.lead_time(),
                            error
                        );
                    }
                }))
            })
            .collect()
    }
}
