//! Shared fakes for the workspace integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use learner_lib::adapters::{ChannelNotifier, JsonFileStore};
use learner_lib::config::WorkspaceTiming;
use learner_lib::workspace::WorkspaceContext;
use learning_core::domain::{
    AssistantQuery, Course, CourseDraft, CourseId, Material, MaterialUpload, Note, Notification,
    Quiz, QuizQuestion, QuizRequest, QuizResult, StudySessionReport, TopicDetail, TopicId,
    TopicSummary,
};
use learning_core::ports::{
    AssistantService, AuthContext, CourseCatalogService, KeyValueStore, LearningService,
    PortError, PortResult, TOKEN_KEY,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// One request as the fake backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListCourses,
    CreateCourse(String),
    UploadMaterial(CourseId, String),
    GetCourse(CourseId),
    ListMaterials(CourseId),
    ListTopics(CourseId),
    GetTopic(String),
    SaveNotes(String, String),
    CompleteTopic(String),
    GenerateQuiz(String, u32),
    SubmitQuizResult(String, u32, u32),
    RecordStudySession(Option<String>, u64),
    Ask(String),
    Explain(String),
}

/// An in-memory stand-in for the REST API that records every call.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    topics: Mutex<Vec<TopicDetail>>,
    quizzes: Mutex<HashMap<String, Quiz>>,
    quiz_delay: Mutex<Duration>,
    topic_delay: Mutex<Duration>,
    save_delay: Mutex<Duration>,
    saves_in_flight: Mutex<usize>,
    max_saves_in_flight: Mutex<usize>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FakeBackend {
    pub fn with_topics(topics: Vec<TopicDetail>) -> Self {
        let backend = Self::default();
        *backend.topics.lock().unwrap() = topics;
        backend
    }

    pub fn set_quiz(&self, topic_id: &str, quiz: Quiz) {
        self.quizzes
            .lock()
            .unwrap()
            .insert(topic_id.to_string(), quiz);
    }

    pub fn delay_quizzes(&self, delay: Duration) {
        *self.quiz_delay.lock().unwrap() = delay;
    }

    pub fn delay_topic_loads(&self, delay: Duration) {
        *self.topic_delay.lock().unwrap() = delay;
    }

    pub fn delay_saves(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = delay;
    }

    /// The most `save_notes` requests that were ever outstanding at once.
    pub fn max_concurrent_saves(&self) -> usize {
        *self.max_saves_in_flight.lock().unwrap()
    }

    /// Makes every later call of `operation` fail with a 500.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SaveNotes(topic, content) => Some((topic, content)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, auth: &AuthContext, operation: &'static str, call: Call) -> PortResult<()> {
        auth.bearer_token()?;
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(operation) {
            return Err(PortError::Status(500));
        }
        Ok(())
    }

    fn summaries(&self) -> Vec<TopicSummary> {
        self.topics
            .lock()
            .unwrap()
            .iter()
            .map(|t| TopicSummary {
                id: t.id.clone(),
                title: t.title.clone(),
                description: t.description.clone(),
                completed: t.completed,
            })
            .collect()
    }
}

#[async_trait]
impl CourseCatalogService for FakeBackend {
    async fn list_courses(&self, auth: &AuthContext) -> PortResult<Vec<Course>> {
        self.record(auth, "list_courses", Call::ListCourses)?;
        Ok(vec![course(CourseId(7))])
    }

    async fn create_course(&self, auth: &AuthContext, draft: &CourseDraft) -> PortResult<Course> {
        self.record(auth, "create_course", Call::CreateCourse(draft.title.clone()))?;
        Ok(Course {
            title: draft.title.clone(),
            ..course(CourseId(42))
        })
    }

    async fn upload_material(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
        upload: &MaterialUpload,
    ) -> PortResult<Material> {
        self.record(
            auth,
            "upload_material",
            Call::UploadMaterial(course_id, upload.file_name.clone()),
        )?;
        if upload.bytes.is_empty() {
            return Err(PortError::Status(422));
        }
        Ok(Material {
            id: 1,
            title: upload.file_name.clone(),
            description: None,
        })
    }

    async fn get_course(&self, auth: &AuthContext, course_id: CourseId) -> PortResult<Course> {
        self.record(auth, "get_course", Call::GetCourse(course_id))?;
        Ok(course(course_id))
    }

    async fn list_materials(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
    ) -> PortResult<Vec<Material>> {
        self.record(auth, "list_materials", Call::ListMaterials(course_id))?;
        Ok(vec![Material {
            id: 3,
            title: "Lecture slides".to_string(),
            description: None,
        }])
    }
}

#[async_trait]
impl LearningService for FakeBackend {
    async fn list_topics(
        &self,
        auth: &AuthContext,
        course_id: CourseId,
    ) -> PortResult<Vec<TopicSummary>> {
        self.record(auth, "list_topics", Call::ListTopics(course_id))?;
        Ok(self.summaries())
    }

    async fn get_topic(&self, auth: &AuthContext, topic_id: &TopicId) -> PortResult<TopicDetail> {
        self.record(auth, "get_topic", Call::GetTopic(topic_id.to_string()))?;
        let delay = *self.topic_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.topics
            .lock()
            .unwrap()
            .iter()
            .find(|t| &t.id == topic_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(topic_id.to_string()))
    }

    async fn save_notes(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        content: &str,
    ) -> PortResult<()> {
        let recorded = self.record(
            auth,
            "save_notes",
            Call::SaveNotes(topic_id.to_string(), content.to_string()),
        );
        {
            let mut in_flight = self.saves_in_flight.lock().unwrap();
            *in_flight += 1;
            let mut max = self.max_saves_in_flight.lock().unwrap();
            *max = (*max).max(*in_flight);
        }
        let delay = *self.save_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        *self.saves_in_flight.lock().unwrap() -= 1;
        recorded
    }

    async fn complete_topic(&self, auth: &AuthContext, topic_id: &TopicId) -> PortResult<()> {
        self.record(auth, "complete_topic", Call::CompleteTopic(topic_id.to_string()))?;
        for topic in self.topics.lock().unwrap().iter_mut() {
            if &topic.id == topic_id {
                topic.completed = true;
            }
        }
        Ok(())
    }

    async fn generate_quiz(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        request: &QuizRequest,
    ) -> PortResult<Quiz> {
        self.record(
            auth,
            "generate_quiz",
            Call::GenerateQuiz(topic_id.to_string(), request.num_questions),
        )?;
        let delay = *self.quiz_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.quizzes
            .lock()
            .unwrap()
            .get(topic_id.as_str())
            .cloned()
            .ok_or_else(|| PortError::NotFound(topic_id.to_string()))
    }

    async fn submit_quiz_result(
        &self,
        auth: &AuthContext,
        topic_id: &TopicId,
        result: &QuizResult,
    ) -> PortResult<()> {
        self.record(
            auth,
            "submit_quiz_result",
            Call::SubmitQuizResult(
                topic_id.to_string(),
                result.correct_answers,
                result.total_questions,
            ),
        )
    }

    async fn record_study_session(
        &self,
        auth: &AuthContext,
        report: &StudySessionReport,
    ) -> PortResult<()> {
        self.record(
            auth,
            "record_study_session",
            Call::RecordStudySession(
                report.topic_id.as_ref().map(|t| t.to_string()),
                report.duration_seconds,
            ),
        )
    }
}

#[async_trait]
impl AssistantService for FakeBackend {
    async fn ask(&self, auth: &AuthContext, query: &AssistantQuery) -> PortResult<String> {
        self.record(auth, "ask", Call::Ask(query.text.clone()))?;
        Ok(format!("About {}: it depends.", query.text))
    }

    async fn explain(&self, auth: &AuthContext, query: &AssistantQuery) -> PortResult<String> {
        self.record(auth, "explain", Call::Explain(query.text.clone()))?;
        Ok(format!("## {}\n\nAn explanation.", query.text))
    }
}

//=========================================================================================
// Builders
//=========================================================================================

pub fn course(id: CourseId) -> Course {
    Course {
        id,
        title: "Data Structures".to_string(),
        description: "Trees, heaps and graphs".to_string(),
        domain: Some("Computer Science".to_string()),
        level: Some("Intermediate".to_string()),
    }
}

pub fn topic(id: &str, title: &str, completed: bool, notes: Option<&str>) -> TopicDetail {
    TopicDetail {
        id: TopicId::new(id),
        title: title.to_string(),
        description: format!("All about {}", title),
        completed,
        notes: notes
            .map(|content| {
                vec![Note {
                    content: content.to_string(),
                    updated_at: None,
                }]
            })
            .unwrap_or_default(),
    }
}

/// A quiz with three options per question and the given answer key.
pub fn quiz(correct: &[usize]) -> Quiz {
    Quiz {
        topic: Some("Binary Trees".to_string()),
        questions: correct
            .iter()
            .enumerate()
            .map(|(i, &answer)| QuizQuestion {
                prompt: format!("Question about trees #{}", i + 1),
                options: vec!["first".into(), "second".into(), "third".into()],
                correct_answer: answer,
                explanation: None,
            })
            .collect(),
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub store: Arc<JsonFileStore>,
    pub ctx: Arc<WorkspaceContext>,
    pub notifications: UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new(backend: FakeBackend) -> Self {
        let backend = Arc::new(backend);
        let store = Arc::new(JsonFileStore::in_memory());
        store.set(TOKEN_KEY, "test-token").unwrap();
        let (notifier, notifications) = ChannelNotifier::new();
        let ctx = Arc::new(WorkspaceContext {
            catalog: backend.clone(),
            learning: backend.clone(),
            assistant: backend.clone(),
            store: store.clone(),
            notifier: Arc::new(notifier),
            timing: WorkspaceTiming::default(),
        });
        Self {
            backend,
            store,
            ctx,
            notifications,
        }
    }

    /// Everything notified since the last drain.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            out.push(notification);
        }
        out
    }
}
