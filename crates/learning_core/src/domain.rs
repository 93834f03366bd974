//! crates/learning_core/src/domain.rs
//!
//! Defines the pure, core data structures for the learning workspace.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Body text of the notes shown for a topic that has no saved notes yet.
pub const NOTES_PLACEHOLDER_BODY: &str =
    "This is where your notes for this topic will appear. Start typing to add notes.";

/// Shown in quiz review when a question carries no explanation of its own.
pub const DEFAULT_EXPLANATION: &str = "This answer is correct based on the course materials.";

//=========================================================================================
// Identifiers
//=========================================================================================

/// Numeric course identifier, sent as an integer in request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseId(pub i64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque topic identifier. The client never interprets it beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TopicId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

//=========================================================================================
// Courses and Materials
//=========================================================================================

/// Course header data, as listed on the dashboard and shown above the topic view.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub domain: Option<String>,
    pub level: Option<String>,
}

/// A study material (uploaded file or reference) attached to a course.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniversityDetails {
    pub name: String,
    pub course_code: String,
    pub department: String,
    pub term: String,
}

/// A reading the course author recommends, entered by hand in the creation flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedMaterial {
    pub title: String,
    pub authors: String,
    pub kind: String,
    pub description: String,
}

/// Everything the course creation flow collects before the course exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub domain: String,
    pub level: String,
    pub university_details: UniversityDetails,
    pub recommended_materials: Vec<RecommendedMaterial>,
}

impl CourseDraft {
    /// Title, domain and level are required before a draft can be submitted.
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.domain, &self.level]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// A local file queued for upload as course material.
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded(Material),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadStatus {
    pub file_name: String,
    pub outcome: UploadOutcome,
}

//=========================================================================================
// Topics, Notes and Objectives
//=========================================================================================

/// One row of a course's topic list.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub id: TopicId,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// A saved note. Only the most recent one is ever edited by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub content: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full topic detail, with notes ordered most-recent-first.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDetail {
    pub id: TopicId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub notes: Vec<Note>,
}

impl TopicDetail {
    pub fn latest_note(&self) -> Option<&Note> {
        self.notes.first()
    }

    /// The text the notes editor starts with: the latest note, or a placeholder.
    pub fn initial_notes(&self) -> String {
        match self.latest_note() {
            Some(note) => note.content.clone(),
            None => placeholder_notes(&self.title),
        }
    }
}

pub fn placeholder_notes(title: &str) -> String {
    format!("# {}\n\n{}", title, NOTES_PLACEHOLDER_BODY)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    pub id: u32,
    pub title: String,
    pub completed: bool,
}

/// Builds the four learning objectives every topic is presented with.
pub fn derive_objectives(title: &str, completed: bool) -> Vec<Objective> {
    [
        format!("Understand key concepts of {}", title),
        format!("Apply {} principles to real-world scenarios", title),
        format!(
            "Analyze the relationship between {} and other course topics",
            title
        ),
        format!(
            "Evaluate the importance of {} in the overall subject domain",
            title
        ),
    ]
    .into_iter()
    .zip(1..)
    .map(|(title, id)| Objective {
        id,
        title,
        completed,
    })
    .collect()
}

/// Percentage of completed topics, rounded to the nearest whole number.
pub fn course_progress(topics: &[TopicSummary]) -> u32 {
    if topics.is_empty() {
        return 0;
    }
    let completed = topics.iter().filter(|t| t.completed).count();
    ((completed as f64 / topics.len() as f64) * 100.0).round() as u32
}

//=========================================================================================
// Quizzes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Parameters of a quiz generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRequest {
    pub course_id: CourseId,
    pub difficulty: Difficulty,
    pub num_questions: u32,
}

impl QuizRequest {
    /// The quiz taken from the topic view: medium difficulty, five questions.
    pub fn for_topic(course_id: CourseId) -> Self {
        Self {
            course_id,
            difficulty: Difficulty::Medium,
            num_questions: 5,
        }
    }

    /// The shorter quiz the assistant posts into its chat transcript.
    pub fn for_assistant(course_id: CourseId) -> Self {
        Self {
            course_id,
            difficulty: Difficulty::Medium,
            num_questions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn explanation_or_default(&self) -> &str {
        self.explanation
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(DEFAULT_EXPLANATION)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    /// Topic label the generator attached, if any.
    pub topic: Option<String>,
    pub questions: Vec<QuizQuestion>,
}

/// Selected option per question index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAnswerSet(BTreeMap<usize, usize>);

impl QuizAnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer, replacing any earlier selection for the same question.
    pub fn select(&mut self, question: usize, option: usize) {
        self.0.insert(question, option);
    }

    pub fn get(&self, question: usize) -> Option<usize> {
        self.0.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True once every question of `quiz` has an answer.
    pub fn is_complete_for(&self, quiz: &Quiz) -> bool {
        (0..quiz.questions.len()).all(|q| self.0.contains_key(&q))
    }
}

/// Client-computed outcome of a quiz attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Percentage in `0.0..=100.0`, unrounded.
    pub score: f64,
}

impl QuizResult {
    /// Score rounded for display, halves rounding away from zero.
    pub fn display_percent(&self) -> i64 {
        self.score.round() as i64
    }

    pub fn summary(&self) -> String {
        format!(
            "You got {} out of {} correct ({}%)",
            self.correct_answers,
            self.total_questions,
            self.display_percent()
        )
    }
}

/// Scores `answers` against `quiz` by exact index equality.
///
/// Unanswered questions count as incorrect. An empty quiz scores zero.
pub fn score_quiz(quiz: &Quiz, answers: &QuizAnswerSet) -> QuizResult {
    let total = quiz.questions.len() as u32;
    let correct = quiz
        .questions
        .iter()
        .enumerate()
        .filter(|(index, question)| answers.get(*index) == Some(question.correct_answer))
        .count() as u32;
    let score = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };
    QuizResult {
        correct_answers: correct,
        total_questions: total,
        score,
    }
}

/// How one option of a submitted question should be marked in review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionMark {
    pub selected: bool,
    pub correct: bool,
}

//=========================================================================================
// Study Sessions
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StudySessionReport {
    pub course_id: CourseId,
    pub topic_id: Option<TopicId>,
    pub duration_seconds: u64,
}

/// Renders a duration as `HH:MM:SS`. Hours are not capped at 24.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

//=========================================================================================
// Assistant
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    Chat,
    Explain,
    Quiz,
}

/// The text and context of a single assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantQuery {
    pub course_id: CourseId,
    pub topic_id: Option<TopicId>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
    /// The bearer token is missing or was rejected; the host should send the user to login.
    LoginRequired,
}

/// A non-blocking, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn login_required() -> Self {
        Self {
            kind: NotificationKind::LoginRequired,
            title: "Session expired".to_string(),
            description: "Please log in again.".to_string(),
        }
    }
}
