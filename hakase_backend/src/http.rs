use async_trait::async_trait;
use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};

use hakase_models::{
    assignment::{Assignment, AssignmentId},
    course::Course,
};

use crate::{BackendClient, BackendError};

const COURSES: &str = "courses";
const ASSIGNMENTS: &str = "assignments";

pub struct HttpBackendClient {
    url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpBackendClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(url, api_key, reqwest::Client::new())
    }

    pub fn with_client(
        url: impl Into<String>,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        let url = url.into().trim_end_matches('/').to_owned();

        Self {
            url,
            api_key: api_key.into(),
            http,
        }
    }

    fn request(&self, method: Method, resource: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.url, resource))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
    }

    async fn send(
        &self,
        method: Method,
        resource: &'static str,
        id: &str,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<Response, BackendError> {
        log::debug!("[BACKEND] {method} {resource} [id = {id}]");
        let response = request.send().await?;

        match response.status() {
            status if status == expected => Ok(response),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound {
                resource,
                id: id.to_owned(),
            }),
            status => Err(BackendError::UnexpectedStatus {
                method,
                resource,
                status: status.as_u16(),
            }),
        }
    }

    async fn get_one<T: serde::de::DeserializeOwned>(
        &self,
        resource: &'static str,
        key: &str,
        id: &str,
    ) -> Result<T, BackendError> {
        let request = self.request(Method::GET, resource).query(&[(key, id)]);
        let response = self
            .send(Method::GET, resource, id, request, StatusCode::OK)
            .await?;

        Ok(response.json().await?)
    }

    async fn head(&self, resource: &'static str, key: &str, id: &str) -> Result<(), BackendError> {
        let request = self.request(Method::HEAD, resource).query(&[(key, id)]);
        self.send(Method::HEAD, resource, id, request, StatusCode::OK)
            .await?;

        Ok(())
    }

    async fn write<T>(
        &self,
        method: Method,
        resource: &'static str,
        id: &str,
        body: &T,
        expected: StatusCode,
    ) -> Result<T, BackendError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let request = self.request(method.clone(), resource).json(body);
        let response = self.send(method, resource, id, request, expected).await?;

        Ok(response.json().await?)
    }

    async fn delete(&self, resource: &'static str, key: &str, id: &str) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, resource).query(&[(key, id)]);
        self.send(Method::DELETE, resource, id, request, StatusCode::NO_CONTENT)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn read_course(&self, course_id: &str) -> Result<Course, BackendError> {
        self.get_one(COURSES, "course_id", course_id).await
    }

    async fn head_course(&self, course_id: &str) -> Result<(), BackendError> {
        self.head(COURSES, "course_id", course_id).await
    }

    async fn create_course(&self, course: &Course) -> Result<Course, BackendError> {
        self.write(
            Method::POST,
            COURSES,
            &course.course_id,
            course,
            StatusCode::CREATED,
        )
        .await
    }

    async fn update_course(&self, course: &Course) -> Result<Course, BackendError> {
        self.write(
            Method::PATCH,
            COURSES,
            &course.course_id,
            course,
            StatusCode::ACCEPTED,
        )
        .await
    }

    async fn delete_course(&self, course_id: &str) -> Result<(), BackendError> {
        self.delete(COURSES, "course_id", course_id).await
    }

    async fn read_assignment(&self, id: AssignmentId) -> Result<Assignment, BackendError> {
        self.get_one(ASSIGNMENTS, "id", &id.to_string()).await
    }

    async fn head_assignment(&self, id: AssignmentId) -> Result<(), BackendError> {
        self.head(ASSIGNMENTS, "id", &id.to_string()).await
    }

    async fn list_assignments(&self, course_id: &str) -> Result<Vec<Assignment>, BackendError> {
        self.get_one(ASSIGNMENTS, "course_id", course_id).await
    }

    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment, BackendError> {
        self.write(
            Method::POST,
            ASSIGNMENTS,
            &assignment.course_id,
            assignment,
            StatusCode::CREATED,
        )
        .await
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment, BackendError> {
        self.write(
            Method::PATCH,
            ASSIGNMENTS,
            &assignment.id.to_string(),
            assignment,
            StatusCode::ACCEPTED,
        )
        .await
    }

    async fn delete_assignment(&self, id: AssignmentId) -> Result<(), BackendError> {
        self.delete(ASSIGNMENTS, "id", &id.to_string()).await
    }
}
