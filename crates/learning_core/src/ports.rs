//! crates/learning_core/src/ports.rs
//!
//! Defines the service contracts (traits) the learning workspace depends on.
//! The workspace logic only talks to the remote course API, the browser-style
//! key-value store and the notification surface through these traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{
    AssistantQuery, Course, CourseDraft, CourseId, Material, MaterialUpload, Notification, Quiz,
    QuizRequest, QuizResult, StudySessionReport, TopicDetail, TopicId, TopicSummary,
};

/// Storage key holding the bearer token written by the login flow.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the serialized logged-in user.
pub const USER_KEY: &str = "user";

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request failed with status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Key-Value Storage and Auth Context
//=========================================================================================

/// Persistent string key-value storage shared by the login flow and the workspace.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> PortResult<()>;
    fn remove(&self, key: &str) -> PortResult<()>;
}

/// Credentials handed to every request-issuing port call.
///
/// The token is looked up in the store each time it is needed, so a token
/// written or cleared by the login flow takes effect on the very next request.
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<dyn KeyValueStore>,
}

impl AuthContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn bearer_token(&self) -> PortResult<String> {
        self.store
            .get(TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
            .ok_or(PortError::Unauthorized)
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_ok()
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CourseCatalogService: Send + Sync {
    async fn list_courses(&self, auth: &AuthContext) -> PortResult<Vec<Course>>;

    async fn create_course(&self, auth: &AuthContext, draft: &CourseDraft) -> PortResult<Course>;

    async fn upload_material(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
        upload: &MaterialUpload,
    ) -> PortResult<Material>;

    async fn get_course(&self, auth: &AuthContext, course_id: CourseId) -> PortResult<Course>;

    async fn list_materials(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
    ) -> PortResult<Vec<Material>>;
}

#[async_trait]
pub trait LearningService: Send + Sync {
    async fn list_topics(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
    ) -> PortResult<Vec<TopicSummary>>;

    async fn get_topic(&self, auth: &AuthContext, topic_id: &TopicId) -> PortResult<TopicDetail>;

    /// Posts the full notes content; the server decides how to version it.
    async fn save_notes(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        content: &str,
    ) -> PortResult<()>;

    async fn complete_topic(&self, auth: &AuthContext, topic_id: &TopicId) -> PortResult<()>;

    async fn generate_quiz(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        request: &QuizRequest,
    ) -> PortResult<Quiz>;

    async fn submit_quiz_result(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        result: &QuizResult,
    ) -> PortResult<()>;

    async fn record_study_session(
        &self,
        auth: &AuthContext,
        report: &StudySessionReport,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Answers a free-form question about the course.
    async fn ask(&self, auth: &AuthContext, query: &AssistantQuery) -> PortResult<String>;

    /// Explains a concept, formatted as markdown.
    async fn explain(&self, auth: &AuthContext, query: &AssistantQuery) -> PortResult<String>;
}

/// Delivers user-visible notifications (the toast surface of a UI host).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
