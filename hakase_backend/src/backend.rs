use async_trait::async_trait;
use thiserror::Error;

use hakase_models::{
    assignment::{Assignment, AssignmentId},
    course::Course,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("unexpected status {status} for {method} {resource}")]
    UnexpectedStatus {
        method: reqwest::Method,
        resource: &'static str,
        status: u16,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// CRUD surface of the remote course/assignment API.
#[async_trait]
pub trait BackendClient: Send + Sync + 'static {
    async fn read_course(&self, course_id: &str) -> Result<Course, BackendError>;
    async fn head_course(&self, course_id: &str) -> Result<(), BackendError>;
    async fn create_course(&self, course: &Course) -> Result<Course, BackendError>;
    async fn update_course(&self, course: &Course) -> Result<Course, BackendError>;
    async fn delete_course(&self, course_id: &str) -> Result<(), BackendError>;

    async fn read_assignment(&self, id: AssignmentId) -> Result<Assignment, BackendError>;
    async fn head_assignment(&self, id: AssignmentId) -> Result<(), BackendError>;
    async fn list_assignments(&self, course_id: &str) -> Result<Vec<Assignment>, BackendError>;
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment, BackendError>;
    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment, BackendError>;
    async fn delete_assignment(&self, id: AssignmentId) -> Result<(), BackendError>;
}
