//! services/learner/src/workspace/assistant.rs
//!
//! The AI assistant side panel: a chat transcript fed by the ask, explain and
//! quiz endpoints.

use std::fmt::Write as _;
use std::sync::Arc;

use learning_core::domain::{
    AssistantMode, AssistantQuery, ChatMessage, ChatRole, CourseId, Quiz, QuizRequest, TopicId,
};
use learning_core::ports::{PortError, PortResult};
use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use crate::error::{LearnerError, LearnerResult};
use crate::workspace::state::WorkspaceContext;

pub const WELCOME_MESSAGE: &str = "👋 Hi there! I'm your AI learning assistant. I can help you understand the course materials, explain concepts, generate quizzes, and more. What would you like help with today?";
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";
pub const NO_QUIZ_MESSAGE: &str = "I couldn't generate a quiz at this time.";
pub const NO_ANSWER_MESSAGE: &str = "I don't have a specific answer for that.";

/// One assistant turn, tagged by the endpoint that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Answer(String),
    Explanation(String),
    Quiz(Quiz),
}

impl AssistantReply {
    /// The transcript text for this reply.
    pub fn render(&self) -> String {
        match self {
            AssistantReply::Answer(text) | AssistantReply::Explanation(text) => {
                if text.trim().is_empty() {
                    NO_ANSWER_MESSAGE.to_string()
                } else {
                    text.clone()
                }
            }
            AssistantReply::Quiz(quiz) => format_quiz_reply(quiz),
        }
    }
}

/// Renders a quiz as a chat message with lettered options.
pub fn format_quiz_reply(quiz: &Quiz) -> String {
    if quiz.questions.is_empty() {
        return NO_QUIZ_MESSAGE.to_string();
    }

    let mut out = format!(
        "Here's a quiz about {}:\n\n",
        quiz.topic.as_deref().unwrap_or("this topic")
    );
    for (index, question) in quiz.questions.iter().enumerate() {
        let _ = writeln!(out, "**Question {}:** {}", index + 1, question.prompt);
        for (label, option) in ('A'..='Z').zip(&question.options) {
            let _ = writeln!(out, "{}) {}", label, option);
        }
        out.push('\n');
    }
    out.push_str("Reply with your answers, and I'll provide explanations!");
    out
}

struct AssistantState {
    mode: AssistantMode,
    transcript: Vec<ChatMessage>,
    responding: bool,
}

pub struct AiAssistant {
    ctx: Arc<WorkspaceContext>,
    course_id: CourseId,
    topic: watch::Receiver<Option<TopicId>>,
    state: Mutex<AssistantState>,
}

impl AiAssistant {
    pub fn new(
        ctx: Arc<WorkspaceContext>,
        course_id: CourseId,
        topic: watch::Receiver<Option<TopicId>>,
    ) -> Self {
        Self {
            ctx,
            course_id,
            topic,
            state: Mutex::new(AssistantState {
                mode: AssistantMode::Chat,
                transcript: vec![ChatMessage {
                    role: ChatRole::Assistant,
                    content: WELCOME_MESSAGE.to_string(),
                }],
                responding: false,
            }),
        }
    }

    pub async fn mode(&self) -> AssistantMode {
        self.state.lock().await.mode
    }

    pub async fn set_mode(&self, mode: AssistantMode) {
        self.state.lock().await.mode = mode;
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.state.lock().await.transcript.clone()
    }

    pub async fn is_responding(&self) -> bool {
        self.state.lock().await.responding
    }

    /// Sends `text` in the current mode and appends both sides to the transcript.
    ///
    /// Returns the assistant's message, or `None` for blank input. Request
    /// failures become an apology in the transcript rather than an error.
    pub async fn send(&self, text: &str) -> LearnerResult<Option<String>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mode = {
            let mut state = self.state.lock().await;
            if state.responding {
                return Err(LearnerError::InvalidState(
                    "the assistant is still responding".to_string(),
                ));
            }
            state.responding = true;
            state.transcript.push(ChatMessage {
                role: ChatRole::User,
                content: text.to_string(),
            });
            state.mode
        };

        let query = AssistantQuery {
            course_id: self.course_id,
            topic_id: self.topic.borrow().clone(),
            text: text.to_string(),
        };
        let content = match self.request(mode, &query).await {
            Ok(reply) => reply.render(),
            Err(e) => {
                error!("Assistant request in {:?} mode failed: {}", mode, e);
                APOLOGY_MESSAGE.to_string()
            }
        };

        let mut state = self.state.lock().await;
        state.transcript.push(ChatMessage {
            role: ChatRole::Assistant,
            content: content.clone(),
        });
        state.responding = false;
        Ok(Some(content))
    }

    async fn request(&self, mode: AssistantMode, query: &AssistantQuery) -> PortResult<AssistantReply> {
        let auth = self.ctx.auth();
        match mode {
            AssistantMode::Chat => self
                .ctx
                .assistant
                .ask(&auth, query)
                .await
                .map(AssistantReply::Answer),
            AssistantMode::Explain => self
                .ctx
                .assistant
                .explain(&auth, query)
                .await
                .map(AssistantReply::Explanation),
            AssistantMode::Quiz => {
                let topic_id = query
                    .topic_id
                    .as_ref()
                    .ok_or_else(|| PortError::Unexpected("no topic selected".to_string()))?;
                info!("Assistant requesting a quiz for topic {}", topic_id);
                self.ctx
                    .learning
                    .generate_quiz(&auth, topic_id, &QuizRequest::for_assistant(self.course_id))
                    .await
                    .map(AssistantReply::Quiz)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learning_core::domain::QuizQuestion;

    #[test]
    fn quiz_reply_letters_options_and_falls_back_on_topic() {
        let quiz = Quiz {
            topic: None,
            questions: vec![QuizQuestion {
                prompt: "What is a heap?".to_string(),
                options: vec!["A tree".to_string(), "A list".to_string()],
                correct_answer: 0,
                explanation: None,
            }],
        };
        assert_eq!(
            format_quiz_reply(&quiz),
            "Here's a quiz about this topic:\n\n\
             **Question 1:** What is a heap?\n\
             A) A tree\n\
             B) A list\n\
             \n\
             Reply with your answers, and I'll provide explanations!"
        );
    }

    #[test]
    fn empty_replies_use_fixed_messages() {
        let empty = Quiz {
            topic: Some("Graphs".to_string()),
            questions: vec![],
        };
        assert_eq!(AssistantReply::Quiz(empty).render(), NO_QUIZ_MESSAGE);
        assert_eq!(
            AssistantReply::Answer("  ".to_string()).render(),
            NO_ANSWER_MESSAGE
        );
        assert_eq!(
            AssistantReply::Explanation("**Heaps**".to_string()).render(),
            "**Heaps**"
        );
    }
}
