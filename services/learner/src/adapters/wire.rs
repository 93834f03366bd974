//! services/learner/src/adapters/wire.rs
//!
//! JSON shapes exchanged with the learning REST API. Every response is wrapped
//! in a `{ "data": ... }` envelope; each endpoint gets its own record type that
//! is converted into a domain value, rejecting shapes the workspace cannot use.

use chrono::{DateTime, NaiveDateTime, Utc};
use learning_core::domain::{
    AssistantQuery, Course, CourseDraft, CourseId, Material, Note, Quiz, QuizQuestion,
    QuizRequest, QuizResult, StudySessionReport, TopicDetail, TopicId, TopicSummary,
};
use learning_core::ports::{PortError, PortResult};
use serde::{Deserialize, Deserializer, Serialize};

//=========================================================================================
// Envelope and Identifiers
//=========================================================================================

#[derive(Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Topic ids arrive as either numbers or strings; both are kept as opaque text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

fn opaque_id<'de, D>(deserializer: D) -> Result<TopicId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(id) => TopicId::new(id.to_string()),
        RawId::Text(id) => TopicId::new(id),
    })
}

/// Accepts RFC 3339 timestamps as well as naive ISO timestamps (taken as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

//=========================================================================================
// Response Records
//=========================================================================================

#[derive(Deserialize)]
pub struct CourseRecord {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    level: Option<String>,
}
impl CourseRecord {
    pub fn to_domain(self) -> Course {
        Course {
            id: CourseId(self.id),
            title: self.title,
            description: self.description.unwrap_or_default(),
            domain: self.domain,
            level: self.level,
        }
    }
}

#[derive(Deserialize)]
pub struct MaterialRecord {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
}
impl MaterialRecord {
    pub fn to_domain(self) -> Material {
        Material {
            id: self.id,
            title: self.title,
            description: self.description,
        }
    }
}

#[derive(Deserialize)]
pub struct TopicSummaryRecord {
    #[serde(deserialize_with = "opaque_id")]
    id: TopicId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
}
impl TopicSummaryRecord {
    pub fn to_domain(self) -> TopicSummary {
        TopicSummary {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
        }
    }
}

#[derive(Deserialize)]
pub struct NoteRecord {
    content: String,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        let updated_at = self
            .updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .and_then(parse_timestamp);
        Note {
            content: self.content,
            updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct TopicDetailRecord {
    #[serde(deserialize_with = "opaque_id")]
    id: TopicId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    notes: Option<Vec<NoteRecord>>,
}
impl TopicDetailRecord {
    pub fn to_domain(self) -> TopicDetail {
        TopicDetail {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
            notes: self
                .notes
                .unwrap_or_default()
                .into_iter()
                .map(NoteRecord::to_domain)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
pub struct QuestionRecord {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Deserialize)]
pub struct QuizRecord {
    #[serde(default)]
    topic: Option<String>,
    questions: Vec<QuestionRecord>,
}
impl QuizRecord {
    /// Rejects quizzes whose answer keys point outside their option lists.
    pub fn to_domain(self) -> PortResult<Quiz> {
        let mut questions = Vec::with_capacity(self.questions.len());
        for (index, record) in self.questions.into_iter().enumerate() {
            if record.correct_answer >= record.options.len() {
                return Err(PortError::Malformed(format!(
                    "question {} has answer index {} but only {} options",
                    index,
                    record.correct_answer,
                    record.options.len()
                )));
            }
            questions.push(QuizQuestion {
                prompt: record.question,
                options: record.options,
                correct_answer: record.correct_answer,
                explanation: record.explanation,
            });
        }
        Ok(Quiz {
            topic: self.topic,
            questions,
        })
    }
}

/// Reply of the `/learning/ask` endpoint.
#[derive(Deserialize)]
pub struct AskReplyRecord {
    pub answer: String,
}

/// Reply of the `/learning/explain` endpoint.
#[derive(Deserialize)]
pub struct ExplainReplyRecord {
    pub content: String,
}

//=========================================================================================
// Request Bodies
//=========================================================================================

#[derive(Serialize)]
pub struct EmptyBody {}

#[derive(Serialize)]
pub struct SaveNotesBody<'a> {
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct QuizRequestBody {
    course_id: i64,
    difficulty: &'static str,
    num_questions: u32,
}
impl From<&QuizRequest> for QuizRequestBody {
    fn from(request: &QuizRequest) -> Self {
        Self {
            course_id: request.course_id.0,
            difficulty: request.difficulty.as_str(),
            num_questions: request.num_questions,
        }
    }
}

#[derive(Serialize)]
pub struct QuizResultBody {
    correct_answers: u32,
    total_questions: u32,
    score: f64,
}
impl From<&QuizResult> for QuizResultBody {
    fn from(result: &QuizResult) -> Self {
        Self {
            correct_answers: result.correct_answers,
            total_questions: result.total_questions,
            score: result.score,
        }
    }
}

#[derive(Serialize)]
pub struct StudySessionBody<'a> {
    course_id: i64,
    topic_id: Option<&'a str>,
    duration_seconds: u64,
}
impl<'a> From<&'a StudySessionReport> for StudySessionBody<'a> {
    fn from(report: &'a StudySessionReport) -> Self {
        Self {
            course_id: report.course_id.0,
            topic_id: report.topic_id.as_ref().map(TopicId::as_str),
            duration_seconds: report.duration_seconds,
        }
    }
}

#[derive(Serialize)]
pub struct AskBody<'a> {
    course_id: i64,
    topic_id: Option<&'a str>,
    question: &'a str,
}
impl<'a> From<&'a AssistantQuery> for AskBody<'a> {
    fn from(query: &'a AssistantQuery) -> Self {
        Self {
            course_id: query.course_id.0,
            topic_id: query.topic_id.as_ref().map(TopicId::as_str),
            question: &query.text,
        }
    }
}

#[derive(Serialize)]
pub struct ExplainBody<'a> {
    course_id: i64,
    topic_id: Option<&'a str>,
    concept: &'a str,
    format: &'static str,
}
impl<'a> From<&'a AssistantQuery> for ExplainBody<'a> {
    fn from(query: &'a AssistantQuery) -> Self {
        Self {
            course_id: query.course_id.0,
            topic_id: query.topic_id.as_ref().map(TopicId::as_str),
            concept: &query.text,
            format: "markdown",
        }
    }
}

#[derive(Serialize)]
struct UniversityDetailsBody<'a> {
    name: &'a str,
    course_code: &'a str,
    department: &'a str,
    term: &'a str,
}

#[derive(Serialize)]
struct RecommendedMaterialBody<'a> {
    title: &'a str,
    authors: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
pub struct CourseDraftBody<'a> {
    title: &'a str,
    description: &'a str,
    domain: &'a str,
    level: &'a str,
    university_details: UniversityDetailsBody<'a>,
    recommended_materials: Vec<RecommendedMaterialBody<'a>>,
}
impl<'a> From<&'a CourseDraft> for CourseDraftBody<'a> {
    fn from(draft: &'a CourseDraft) -> Self {
        let details = &draft.university_details;
        Self {
            title: &draft.title,
            description: &draft.description,
            domain: &draft.domain,
            level: &draft.level,
            university_details: UniversityDetailsBody {
                name: &details.name,
                course_code: &details.course_code,
                department: &details.department,
                term: &details.term,
            },
            recommended_materials: draft
                .recommended_materials
                .iter()
                .map(|m| RecommendedMaterialBody {
                    title: &m.title,
                    authors: &m.authors,
                    kind: &m.kind,
                    description: &m.description,
                })
                .collect(),
        }
    }
}
