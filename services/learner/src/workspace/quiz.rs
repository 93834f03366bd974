//! services/learner/src/workspace/quiz.rs
//!
//! The quiz lifecycle of a topic: generate, answer, submit, review.
//! This is a pure state machine; the session controller performs the network
//! calls and feeds their outcomes back in through tickets.

use learning_core::domain::{
    score_quiz, OptionMark, Quiz, QuizAnswerSet, QuizResult, TopicId,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::{LearnerError, LearnerResult};

/// The states of one quiz attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    Idle,
    Generating,
    /// The last generation request failed; the user has to regenerate.
    GenerationFailed,
    Active {
        quiz: Quiz,
        answers: QuizAnswerSet,
    },
    Submitted {
        quiz: Quiz,
        answers: QuizAnswerSet,
        result: QuizResult,
    },
}

impl QuizPhase {
    pub fn name(&self) -> &'static str {
        match self {
            QuizPhase::Idle => "idle",
            QuizPhase::Generating => "generating",
            QuizPhase::GenerationFailed => "generation failed",
            QuizPhase::Active { .. } => "active",
            QuizPhase::Submitted { .. } => "submitted",
        }
    }
}

/// Identifies one generation request, so late responses can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizTicket {
    pub id: Uuid,
    pub topic_id: TopicId,
}

#[derive(Debug)]
pub struct QuizLifecycle {
    phase: QuizPhase,
    pending: Option<QuizTicket>,
}

impl Default for QuizLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizLifecycle {
    pub fn new() -> Self {
        Self {
            phase: QuizPhase::Idle,
            pending: None,
        }
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, QuizPhase::Generating)
    }

    /// Enters `Generating` from any state. A newer request supersedes an older one.
    pub fn begin(&mut self, topic_id: TopicId) -> QuizTicket {
        let ticket = QuizTicket {
            id: Uuid::new_v4(),
            topic_id,
        };
        if let Some(previous) = self.pending.replace(ticket.clone()) {
            debug!("Quiz request {} superseded by {}", previous.id, ticket.id);
        }
        self.phase = QuizPhase::Generating;
        ticket
    }

    /// Applies a generated quiz. Returns `false` when the ticket is stale.
    pub fn accept(&mut self, ticket: &QuizTicket, quiz: Quiz) -> bool {
        if self.pending.as_ref() != Some(ticket) {
            return false;
        }
        self.pending = None;
        self.phase = QuizPhase::Active {
            quiz,
            answers: QuizAnswerSet::new(),
        };
        true
    }

    /// Records a failed generation. Returns `false` when the ticket is stale.
    pub fn fail(&mut self, ticket: &QuizTicket) -> bool {
        if self.pending.as_ref() != Some(ticket) {
            return false;
        }
        self.pending = None;
        self.phase = QuizPhase::GenerationFailed;
        true
    }

    /// Drops any quiz and any in-flight request, e.g. on topic change.
    pub fn reset(&mut self) {
        self.pending = None;
        self.phase = QuizPhase::Idle;
    }

    pub fn select_answer(&mut self, question: usize, option: usize) -> LearnerResult<()> {
        let phase_name = self.phase.name();
        let QuizPhase::Active { quiz, answers } = &mut self.phase else {
            return Err(LearnerError::InvalidState(format!(
                "cannot answer while the quiz is {}",
                phase_name
            )));
        };
        let Some(q) = quiz.questions.get(question) else {
            return Err(LearnerError::InvalidInput(format!(
                "question {} does not exist",
                question + 1
            )));
        };
        if option >= q.options.len() {
            return Err(LearnerError::InvalidInput(format!(
                "question {} has no option {}",
                question + 1,
                option + 1
            )));
        }
        answers.select(question, option);
        Ok(())
    }

    /// Submit is enabled only once every question is answered.
    pub fn can_submit(&self) -> bool {
        match &self.phase {
            QuizPhase::Active { quiz, answers } => answers.is_complete_for(quiz),
            _ => false,
        }
    }

    /// Scores the current answers and moves to `Submitted`.
    ///
    /// Totality is not re-checked here: unanswered questions score as wrong.
    pub fn submit(&mut self) -> LearnerResult<QuizResult> {
        let phase = std::mem::replace(&mut self.phase, QuizPhase::Idle);
        match phase {
            QuizPhase::Active { quiz, answers } => {
                let result = score_quiz(&quiz, &answers);
                self.phase = QuizPhase::Submitted {
                    quiz,
                    answers,
                    result: result.clone(),
                };
                Ok(result)
            }
            other => {
                let name = other.name();
                self.phase = other;
                Err(LearnerError::InvalidState(format!(
                    "cannot submit while the quiz is {}",
                    name
                )))
            }
        }
    }

    /// Per-option review marks for a submitted question.
    pub fn option_marks(&self, question: usize) -> Option<Vec<OptionMark>> {
        let QuizPhase::Submitted { quiz, answers, .. } = &self.phase else {
            return None;
        };
        let q = quiz.questions.get(question)?;
        let selected = answers.get(question);
        Some(
            (0..q.options.len())
                .map(|option| OptionMark {
                    selected: selected == Some(option),
                    correct: option == q.correct_answer,
                })
                .collect(),
        )
    }
}
