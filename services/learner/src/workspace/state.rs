//! services/learner/src/workspace/state.rs
//!
//! Defines the workspace's shared context and the per-topic session state.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use learning_core::domain::{CourseId, Notification, Objective, TopicDetail, TopicId, TopicSummary};
use learning_core::ports::{
    AssistantService, AuthContext, CourseCatalogService, KeyValueStore, LearningService, Notifier,
    PortError,
};
use tokio_util::sync::CancellationToken;

use crate::config::WorkspaceTiming;
use crate::workspace::quiz::QuizLifecycle;

//=========================================================================================
// WorkspaceContext (Shared Across All Components)
//=========================================================================================

/// The shared client context, created once at startup and handed to every component.
#[derive(Clone)]
pub struct WorkspaceContext {
    pub catalog: Arc<dyn CourseCatalogService>,
    pub learning: Arc<dyn LearningService>,
    pub assistant: Arc<dyn AssistantService>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
    pub timing: WorkspaceTiming,
}

impl WorkspaceContext {
    /// A fresh auth context over the shared store.
    pub fn auth(&self) -> AuthContext {
        AuthContext::new(self.store.clone())
    }

    /// Surfaces a failed port call to the user.
    pub fn report_failure(&self, err: &PortError, description: &str) {
        let notification = match err {
            PortError::Unauthorized => Notification::login_required(),
            _ => Notification::error(description),
        };
        self.notifier.notify(notification);
    }
}

//=========================================================================================
// TopicSessionState (Specific to One Course Page)
//=========================================================================================

/// Which of the two topic views is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    Notes,
    Quiz,
}

/// Client-only edit state of the active note.
#[derive(Debug, Clone, Default)]
pub struct NoteEditState {
    pub content: String,
    pub dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// A save request is in flight.
    pub saving: bool,
    /// Bumped on every edit so a save only clears `dirty` for the content it sent.
    pub(crate) revision: u64,
}

impl NoteEditState {
    pub(crate) fn loaded(content: String) -> Self {
        Self {
            content,
            dirty: false,
            last_saved_at: Some(Utc::now()),
            saving: false,
            revision: 0,
        }
    }

    /// Human-readable save indicator, or `None` before anything was loaded.
    pub fn status_label(&self, now: DateTime<Utc>) -> Option<String> {
        if self.saving {
            return Some("Saving...".to_string());
        }
        let saved_at = self.last_saved_at?;
        let minutes = (now - saved_at).num_minutes();
        Some(match minutes {
            m if m < 1 => "Saved just now".to_string(),
            1 => "Saved 1 minute ago".to_string(),
            m if m < 60 => format!("Saved {} minutes ago", m),
            _ => format!(
                "Saved at {}",
                saved_at.with_timezone(&Local).format("%H:%M")
            ),
        })
    }
}

/// The mutable state of the topic workspace of one course page.
pub struct TopicSessionState {
    pub course_id: CourseId,
    pub topics: Vec<TopicSummary>,
    /// The topic the workspace is pointed at. Set before its detail arrives.
    pub topic_id: Option<TopicId>,
    pub topic: Option<TopicDetail>,
    pub edit: NoteEditState,
    pub view: SessionView,
    pub quiz: QuizLifecycle,
    pub objectives: Vec<Objective>,
    pub objectives_expanded: bool,
    /// Incremented on every topic switch; responses from older epochs are dropped.
    pub(crate) epoch: u64,
    pub(crate) debounce: Option<CancellationToken>,
}

impl TopicSessionState {
    pub(crate) fn new(course_id: CourseId) -> Self {
        Self {
            course_id,
            topics: Vec::new(),
            topic_id: None,
            topic: None,
            edit: NoteEditState::default(),
            view: SessionView::Notes,
            quiz: QuizLifecycle::new(),
            objectives: Vec::new(),
            objectives_expanded: true,
            epoch: 0,
            debounce: None,
        }
    }

    /// Whether the topic identified by `topic_id` is known to be completed.
    pub fn is_completed(&self, topic_id: &TopicId) -> bool {
        let listed = self
            .topics
            .iter()
            .any(|t| &t.id == topic_id && t.completed);
        let detailed = self
            .topic
            .as_ref()
            .is_some_and(|t| &t.id == topic_id && t.completed);
        listed || detailed
    }

    /// The quiz is offered once every objective is ticked and the topic is complete.
    pub fn quiz_offered(&self) -> bool {
        let Some(topic_id) = &self.topic_id else {
            return false;
        };
        !self.objectives.is_empty()
            && self.objectives.iter().all(|o| o.completed)
            && self.is_completed(topic_id)
    }

    pub(crate) fn cancel_debounce(&mut self) {
        if let Some(token) = self.debounce.take() {
            token.cancel();
        }
    }
}

/// A point-in-time copy of the session state for display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub course_id: CourseId,
    pub topics: Vec<TopicSummary>,
    pub topic_id: Option<TopicId>,
    pub topic: Option<TopicDetail>,
    pub notes: String,
    pub dirty: bool,
    pub saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub view: SessionView,
    pub quiz: crate::workspace::quiz::QuizPhase,
    pub objectives: Vec<Objective>,
    pub objectives_expanded: bool,
    pub quiz_offered: bool,
}

impl From<&TopicSessionState> for SessionSnapshot {
    fn from(state: &TopicSessionState) -> Self {
        Self {
            course_id: state.course_id,
            topics: state.topics.clone(),
            topic_id: state.topic_id.clone(),
            topic: state.topic.clone(),
            notes: state.edit.content.clone(),
            dirty: state.edit.dirty,
            saving: state.edit.saving,
            last_saved_at: state.edit.last_saved_at,
            view: state.view,
            quiz: state.quiz.phase().clone(),
            objectives: state.objectives.clone(),
            objectives_expanded: state.objectives_expanded,
            quiz_offered: state.quiz_offered(),
        }
    }
}
