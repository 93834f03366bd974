//! services/learner/src/adapters/http.rs
//!
//! This module contains the adapter for the learning platform's REST API.
//! It implements the `CourseCatalogService`, `LearningService` and
//! `AssistantService` ports from the `core` crate using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use learning_core::domain::{
    AssistantQuery, Course, CourseDraft, CourseId, Material, MaterialUpload, Quiz, QuizRequest,
    QuizResult, StudySessionReport, TopicDetail, TopicId, TopicSummary,
};
use learning_core::ports::{
    AssistantService, AuthContext, CourseCatalogService, LearningService, PortError, PortResult,
};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::adapters::wire::{
    AskBody, AskReplyRecord, CourseDraftBody, CourseRecord, EmptyBody, Envelope, ExplainBody,
    ExplainReplyRecord, MaterialRecord, QuizRecord, QuizRequestBody, QuizResultBody,
    SaveNotesBody, StudySessionBody, TopicDetailRecord, TopicSummaryRecord,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the learning REST API over HTTP.
#[derive(Clone)]
pub struct HttpLearningAdapter {
    client: Client,
    base_url: String,
}

impl HttpLearningAdapter {
    /// Creates a new `HttpLearningAdapter` rooted at `base_url` (e.g. `.../api/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded, so
    /// an id holding `/` or `?` stays a single path segment.
    fn url(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("bad base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected(format!("base url {} has no path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attaches the bearer token, read from the auth context at call time.
    fn authorized(&self, builder: RequestBuilder, auth: &AuthContext) -> PortResult<RequestBuilder> {
        let token = auth.bearer_token()?;
        Ok(builder.bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder) -> PortResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return Ok(response);
        }
        // Non-2xx is a uniform failure; the body is not inspected.
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
            StatusCode::NOT_FOUND => PortError::NotFound(response.url().path().to_string()),
            other => PortError::Status(other.as_u16()),
        })
    }

    async fn read_data<T: DeserializeOwned>(response: Response) -> PortResult<T> {
        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| PortError::Malformed(e.to_string()))
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        auth: &AuthContext,
        segments: &[&str],
    ) -> PortResult<T> {
        let builder = self.authorized(self.client.get(self.url(segments)?), auth)?;
        let response = self.send(builder).await?;
        Self::read_data(response).await
    }

    async fn post_data<B, T>(&self, auth: &AuthContext, segments: &[&str], body: &B) -> PortResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.authorized(self.client.post(self.url(segments)?).json(body), auth)?;
        let response = self.send(builder).await?;
        Self::read_data(response).await
    }

    /// Posts a body where only the status of the reply matters.
    async fn post_ack<B>(&self, auth: &AuthContext, segments: &[&str], body: &B) -> PortResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let builder = self.authorized(self.client.post(self.url(segments)?).json(body), auth)?;
        self.send(builder).await?;
        Ok(())
    }
}

//=========================================================================================
// `CourseCatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseCatalogService for HttpLearningAdapter {
    async fn list_courses(&self, auth: &AuthContext) -> PortResult<Vec<Course>> {
        let records: Vec<CourseRecord> = self.get_data(auth, &["courses"]).await?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn create_course(&self, auth: &AuthContext, draft: &CourseDraft) -> PortResult<Course> {
        let record: CourseRecord = self
            .post_data(auth, &["courses"], &CourseDraftBody::from(draft))
            .await?;
        Ok(record.to_domain())
    }

    async fn upload_material(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
        upload: &MaterialUpload,
    ) -> PortResult<Material> {
        let part = multipart::Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let form = multipart::Form::new()
            .part("file", part)
            .text("title", upload.file_name.clone());

        let course = course_id.to_string();
        let url = self.url(&["courses", &course, "materials"])?;
        let builder = self.authorized(self.client.post(url).multipart(form), auth)?;
        let response = self.send(builder).await?;
        let record: MaterialRecord = Self::read_data(response).await?;
        Ok(record.to_domain())
    }

    async fn get_course(&self, auth: &AuthContext, course_id: CourseId) -> PortResult<Course> {
        let course = course_id.to_string();
        let record: CourseRecord = self.get_data(auth, &["courses", &course]).await?;
        Ok(record.to_domain())
    }

    async fn list_materials(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
    ) -> PortResult<Vec<Material>> {
        let course = course_id.to_string();
        let records: Vec<MaterialRecord> = self
            .get_data(auth, &["courses", &course, "materials"])
            .await?;
        Ok(records.into_iter().map(MaterialRecord::to_domain).collect())
    }
}

//=========================================================================================
// `LearningService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LearningService for HttpLearningAdapter {
    async fn list_topics(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
    ) -> PortResult<Vec<TopicSummary>> {
        let course = course_id.to_string();
        let records: Vec<TopicSummaryRecord> = self
            .get_data(auth, &["learning", &course, "topics"])
            .await?;
        Ok(records
            .into_iter()
            .map(TopicSummaryRecord::to_domain)
            .collect())
    }

    async fn get_topic(&self, auth: &AuthContext, topic_id: &TopicId) -> PortResult<TopicDetail> {
        let record: TopicDetailRecord = self
            .get_data(auth, &["learning", "topics", topic_id.as_str()])
            .await?;
        Ok(record.to_domain())
    }

    async fn save_notes(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        content: &str,
    ) -> PortResult<()> {
        self.post_ack(
            auth,
            &["learning", "topics", topic_id.as_str(), "notes"],
            &SaveNotesBody { content },
        )
        .await
    }

    async fn complete_topic(&self, auth: &AuthContext, topic_id: &TopicId) -> PortResult<()> {
        self.post_ack(
            auth,
            &["learning", "topics", topic_id.as_str(), "complete"],
            &EmptyBody {},
        )
        .await
    }

    async fn generate_quiz(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        request: &QuizRequest,
    ) -> PortResult<Quiz> {
        let record: QuizRecord = self
            .post_data(
                auth,
                &["learning", "topics", topic_id.as_str(), "quiz"],
                &QuizRequestBody::from(request),
            )
            .await?;
        record.to_domain()
    }

    async fn submit_quiz_result(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        result: &QuizResult,
    ) -> PortResult<()> {
        self.post_ack(
            auth,
            &["learning", "topics", topic_id.as_str(), "quiz", "results"],
            &QuizResultBody::from(result),
        )
        .await
    }

    async fn record_study_session(
        &self,
        auth: &AuthContext,
        report: &StudySessionReport,
    ) -> PortResult<()> {
        self.post_ack(
            auth,
            &["learning", "study-session"],
            &StudySessionBody::from(report),
        )
        .await
    }
}

//=========================================================================================
// `AssistantService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AssistantService for HttpLearningAdapter {
    async fn ask(&self, auth: &AuthContext, query: &AssistantQuery) -> PortResult<String> {
        let reply: AskReplyRecord = self
            .post_data(auth, &["learning", "ask"], &AskBody::from(query))
            .await?;
        Ok(reply.answer)
    }

    async fn explain(&self, auth: &AuthContext, query: &AssistantQuery) -> PortResult<String> {
        let reply: ExplainReplyRecord = self
            .post_data(auth, &["learning", "explain"], &ExplainBody::from(query))
            .await?;
        Ok(reply.content)
    }
}
