//! services/learner/src/workspace/mod.rs
//!
//! The client-side workflow of a course page and the dashboard.

pub mod assistant;
pub mod controller;
pub mod course_page;
pub mod dashboard;
pub mod persistence;
pub mod preferences;
pub mod quiz;
pub mod state;
pub mod timer;

pub use assistant::{AiAssistant, AssistantReply};
pub use controller::{CompletionOutcome, GenerationOutcome, SaveOutcome, TopicSession};
pub use course_page::CoursePage;
pub use dashboard::{CreatedCourse, Dashboard};
pub use preferences::SidebarPrefs;
pub use quiz::{QuizLifecycle, QuizPhase};
pub use state::{SessionSnapshot, SessionView, WorkspaceContext};
pub use timer::{StudyReport, StudyTimer, TimerStop};
