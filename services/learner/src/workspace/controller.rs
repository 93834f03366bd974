//! services/learner/src/workspace/controller.rs
//!
//! The topic session controller: owns the current topic, its notes edit state
//! and the notes/quiz view, and drives saves, completion and the quiz.

use std::sync::Arc;

use chrono::Utc;
use learning_core::domain::{
    derive_objectives, CourseId, Notification, OptionMark, QuizRequest, QuizResult, TopicId,
    TopicSummary,
};
use learning_core::ports::PortResult;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::error::{LearnerError, LearnerResult};
use crate::workspace::persistence::{autosave_loop, idle_flush};
use crate::workspace::preferences::{objectives_key, read_flag, write_flag};
use crate::workspace::quiz::QuizTicket;
use crate::workspace::state::{
    NoteEditState, SessionSnapshot, SessionView, TopicSessionState, WorkspaceContext,
};

/// When a save request should actually be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// User-requested: send whenever there is non-blank content.
    Explicit,
    /// Timer- or switch-triggered: send only unsaved edits.
    IfDirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    SkippedBlank,
    SkippedClean,
    NoTopic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    AlreadyCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Ready,
    /// The topic changed or a newer request was made while this one was in flight.
    Discarded,
}

//=========================================================================================
// SessionCore (Shared With the Background Tasks)
//=========================================================================================

pub(crate) struct SessionCore {
    pub(crate) ctx: Arc<WorkspaceContext>,
    pub(crate) state: Mutex<TopicSessionState>,
    /// Held for the whole duration of a save request.
    save_gate: Mutex<()>,
    topic_tx: watch::Sender<Option<TopicId>>,
}

impl SessionCore {
    /// The single notes save operation every trigger goes through.
    pub(crate) async fn persist(&self, policy: SavePolicy) -> PortResult<SaveOutcome> {
        let _gate = self.save_gate.lock().await;

        let (topic_id, content, revision) = {
            let mut state = self.state.lock().await;
            if policy == SavePolicy::IfDirty && !state.edit.dirty {
                return Ok(SaveOutcome::SkippedClean);
            }
            // Never overwrite real notes with a blank save.
            if state.edit.content.trim().is_empty() {
                return Ok(SaveOutcome::SkippedBlank);
            }
            let Some(topic_id) = state.topic_id.clone() else {
                return Ok(SaveOutcome::NoTopic);
            };
            state.edit.saving = true;
            (topic_id, state.edit.content.clone(), state.edit.revision)
        };

        debug!("Saving {} bytes of notes for topic {}", content.len(), topic_id);
        let result = self
            .ctx
            .learning
            .save_notes(&self.ctx.auth(), &topic_id, &content)
            .await;

        let mut state = self.state.lock().await;
        state.edit.saving = false;
        match result {
            Ok(()) => {
                if state.topic_id.as_ref() == Some(&topic_id) {
                    state.edit.last_saved_at = Some(Utc::now());
                    // Edits made while the request was in flight stay dirty.
                    if state.edit.revision == revision {
                        state.edit.dirty = false;
                    }
                }
                info!("Saved notes for topic {}", topic_id);
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                drop(state);
                error!("Failed to save notes for topic {}: {}", topic_id, e);
                self.ctx
                    .report_failure(&e, "Failed to save notes. Please try again.");
                Err(e)
            }
        }
    }
}

//=========================================================================================
// TopicSession (The Controller Handle)
//=========================================================================================

/// The topic workspace of one course page.
///
/// Must be created inside a tokio runtime: opening it starts the periodic
/// autosave. Dropping the session stops all background tasks without saving;
/// call [`TopicSession::shutdown`] to flush unsaved notes first.
pub struct TopicSession {
    core: Arc<SessionCore>,
    shutdown: CancellationToken,
    _guard: DropGuard,
}

impl TopicSession {
    pub fn open(ctx: Arc<WorkspaceContext>, course_id: CourseId) -> Self {
        let (topic_tx, _) = watch::channel(None);
        let core = Arc::new(SessionCore {
            ctx,
            state: Mutex::new(TopicSessionState::new(course_id)),
            save_gate: Mutex::new(()),
            topic_tx,
        });
        let shutdown = CancellationToken::new();
        tokio::spawn(autosave_loop(core.clone(), shutdown.child_token()));

        Self {
            core,
            _guard: shutdown.clone().drop_guard(),
            shutdown,
        }
    }

    pub async fn course_id(&self) -> CourseId {
        self.core.state.lock().await.course_id
    }

    /// Follows the current topic id; used by the timer and the assistant.
    pub fn subscribe_topic(&self) -> watch::Receiver<Option<TopicId>> {
        self.core.topic_tx.subscribe()
    }

    pub async fn set_topics(&self, topics: Vec<TopicSummary>) {
        self.core.state.lock().await.topics = topics;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.core.state.lock().await)
    }

    pub async fn save_status(&self) -> Option<String> {
        self.core.state.lock().await.edit.status_label(Utc::now())
    }

    //-------------------------------------------------------------------------------------
    // Topic switching and notes
    //-------------------------------------------------------------------------------------

    /// Switches to `topic_id`: flushes the previous topic's unsaved notes, then
    /// fetches the new topic. Always returns to the notes view.
    pub async fn load_topic(&self, topic_id: &TopicId) -> LearnerResult<()> {
        self.core.state.lock().await.cancel_debounce();

        // The flush must land before the next topic's fetch is issued.
        if let Err(e) = self.core.persist(SavePolicy::IfDirty).await {
            warn!("Switching topics with unsaved notes: {}", e);
        }

        let epoch = {
            let mut state = self.core.state.lock().await;
            state.epoch += 1;
            state.topic_id = Some(topic_id.clone());
            state.topic = None;
            state.edit = NoteEditState::default();
            state.view = SessionView::Notes;
            state.quiz.reset();
            state.objectives.clear();
            state.epoch
        };
        self.core.topic_tx.send_replace(Some(topic_id.clone()));

        info!("Loading topic {}", topic_id);
        let result = self
            .core
            .ctx
            .learning
            .get_topic(&self.core.ctx.auth(), topic_id)
            .await;

        let mut state = self.core.state.lock().await;
        if state.epoch != epoch {
            debug!("Topic {} was replaced while loading.", topic_id);
            return Ok(());
        }
        match result {
            Ok(detail) => {
                // Typing that landed during the fetch wins over the fetched notes;
                // its debounce is still armed and will save it to this topic.
                if state.edit.revision == 0 {
                    state.edit = NoteEditState::loaded(detail.initial_notes());
                } else {
                    info!("Keeping notes typed while topic {} was loading.", topic_id);
                }
                state.objectives = derive_objectives(&detail.title, detail.completed);
                state.objectives_expanded =
                    read_flag(self.core.ctx.store.as_ref(), &objectives_key(topic_id), true);
                state.topic = Some(detail);
                Ok(())
            }
            Err(e) => {
                drop(state);
                error!("Failed to load topic {}: {}", topic_id, e);
                self.core
                    .ctx
                    .report_failure(&e, "Failed to load topic details. Please try again.");
                Err(LearnerError::from_port(e))
            }
        }
    }

    /// Replaces the notes text and restarts the idle-save debounce.
    pub async fn edit_notes(&self, content: impl Into<String>) {
        let token = self.shutdown.child_token();
        {
            let mut state = self.core.state.lock().await;
            state.edit.content = content.into();
            state.edit.dirty = true;
            state.edit.revision += 1;
            state.cancel_debounce();
            state.debounce = Some(token.clone());
        }
        tokio::spawn(idle_flush(self.core.clone(), token));
    }

    /// Saves the notes now, whether or not they changed since the last save.
    pub async fn save(&self) -> LearnerResult<SaveOutcome> {
        self.core
            .persist(SavePolicy::Explicit)
            .await
            .map_err(LearnerError::from_port)
    }

    //-------------------------------------------------------------------------------------
    // Completion and objectives
    //-------------------------------------------------------------------------------------

    /// Marks a topic complete. A topic already known to be complete is not re-posted.
    pub async fn mark_completed(&self, topic_id: &TopicId) -> LearnerResult<CompletionOutcome> {
        if self.core.state.lock().await.is_completed(topic_id) {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        match self
            .core
            .ctx
            .learning
            .complete_topic(&self.core.ctx.auth(), topic_id)
            .await
        {
            Ok(()) => {
                let mut state = self.core.state.lock().await;
                for topic in state.topics.iter_mut().filter(|t| &t.id == topic_id) {
                    topic.completed = true;
                }
                if let Some(detail) = state.topic.as_mut().filter(|t| &t.id == topic_id) {
                    detail.completed = true;
                }
                drop(state);
                info!("Topic {} marked as completed", topic_id);
                self.core.ctx.notifier.notify(Notification::success(
                    "Success",
                    "Topic marked as completed",
                ));
                Ok(CompletionOutcome::Completed)
            }
            Err(e) => {
                error!("Failed to complete topic {}: {}", topic_id, e);
                self.core.ctx.report_failure(
                    &e,
                    "Failed to mark topic as complete. Please try again.",
                );
                Err(LearnerError::from_port(e))
            }
        }
    }

    /// Flips one learning objective. Returns whether the quiz is now offered.
    pub async fn toggle_objective(&self, objective_id: u32) -> LearnerResult<bool> {
        let mut state = self.core.state.lock().await;
        let objective = state
            .objectives
            .iter_mut()
            .find(|o| o.id == objective_id)
            .ok_or_else(|| {
                LearnerError::InvalidInput(format!("objective {} does not exist", objective_id))
            })?;
        objective.completed = !objective.completed;

        let offered = state.quiz_offered();
        if offered {
            self.core.ctx.notifier.notify(Notification::info(
                "All objectives completed!",
                "You can now take a quiz to test your knowledge.",
            ));
        }
        Ok(offered)
    }

    pub async fn toggle_objectives_expanded(&self) -> LearnerResult<bool> {
        let mut state = self.core.state.lock().await;
        let topic_id = state
            .topic_id
            .clone()
            .ok_or_else(|| LearnerError::InvalidState("no topic selected".to_string()))?;
        state.objectives_expanded = !state.objectives_expanded;
        write_flag(
            self.core.ctx.store.as_ref(),
            &objectives_key(&topic_id),
            state.objectives_expanded,
        )?;
        Ok(state.objectives_expanded)
    }

    //-------------------------------------------------------------------------------------
    // Quiz
    //-------------------------------------------------------------------------------------

    /// Requests a fresh quiz for the current topic and shows the quiz view.
    pub async fn generate_quiz(&self) -> LearnerResult<GenerationOutcome> {
        let (ticket, course_id): (QuizTicket, CourseId) = {
            let mut state = self.core.state.lock().await;
            let topic_id = state
                .topic_id
                .clone()
                .ok_or_else(|| LearnerError::InvalidState("no topic selected".to_string()))?;
            state.view = SessionView::Quiz;
            (state.quiz.begin(topic_id), state.course_id)
        };

        info!("Requesting quiz {} for topic {}", ticket.id, ticket.topic_id);
        let result = self
            .core
            .ctx
            .learning
            .generate_quiz(
                &self.core.ctx.auth(),
                &ticket.topic_id,
                &QuizRequest::for_topic(course_id),
            )
            .await;

        let mut state = self.core.state.lock().await;
        match result {
            Ok(quiz) => {
                if state.quiz.accept(&ticket, quiz) {
                    Ok(GenerationOutcome::Ready)
                } else {
                    debug!("Discarding stale quiz {}", ticket.id);
                    Ok(GenerationOutcome::Discarded)
                }
            }
            Err(e) => {
                let current = state.quiz.fail(&ticket);
                drop(state);
                error!("Failed to generate quiz for topic {}: {}", ticket.topic_id, e);
                if !current {
                    return Ok(GenerationOutcome::Discarded);
                }
                self.core
                    .ctx
                    .report_failure(&e, "Failed to generate quiz. Please try again.");
                Err(LearnerError::from_port(e))
            }
        }
    }

    pub async fn select_answer(&self, question: usize, option: usize) -> LearnerResult<()> {
        self.core
            .state
            .lock()
            .await
            .quiz
            .select_answer(question, option)
    }

    pub async fn can_submit(&self) -> bool {
        self.core.state.lock().await.quiz.can_submit()
    }

    /// Scores the quiz locally and reports the result.
    ///
    /// The result is shown whether or not the report reaches the server.
    pub async fn submit_quiz(&self) -> LearnerResult<QuizResult> {
        let (topic_id, result) = {
            let mut state = self.core.state.lock().await;
            let topic_id = state
                .topic_id
                .clone()
                .ok_or_else(|| LearnerError::InvalidState("no topic selected".to_string()))?;
            (topic_id, state.quiz.submit()?)
        };

        match self
            .core
            .ctx
            .learning
            .submit_quiz_result(&self.core.ctx.auth(), &topic_id, &result)
            .await
        {
            Ok(()) => {
                self.core
                    .ctx
                    .notifier
                    .notify(Notification::success("Quiz Submitted", result.summary()));
            }
            Err(e) => {
                error!("Failed to submit quiz results for topic {}: {}", topic_id, e);
                self.core
                    .ctx
                    .report_failure(&e, "Failed to submit quiz results. Please try again.");
            }
        }
        Ok(result)
    }

    /// Review marks for one question of a submitted quiz.
    pub async fn option_marks(&self, question: usize) -> Option<Vec<OptionMark>> {
        self.core.state.lock().await.quiz.option_marks(question)
    }

    /// Leaves the quiz view. The quiz itself is kept until the topic changes.
    pub async fn back_to_notes(&self) {
        self.core.state.lock().await.view = SessionView::Notes;
    }

    //-------------------------------------------------------------------------------------
    // Teardown
    //-------------------------------------------------------------------------------------

    /// Stops the background tasks and flushes unsaved notes.
    pub async fn shutdown(self) -> LearnerResult<()> {
        self.shutdown.cancel();
        self.core.state.lock().await.cancel_debounce();
        self.core
            .persist(SavePolicy::IfDirty)
            .await
            .map(|_| ())
            .map_err(LearnerError::from_port)
    }
}
