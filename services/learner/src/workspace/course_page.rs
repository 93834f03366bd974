//! services/learner/src/workspace/course_page.rs
//!
//! Assembles the course page: header, materials, topic workspace, study timer,
//! assistant and sidebar preferences.

use std::sync::Arc;

use learning_core::domain::{course_progress, Course, CourseId, Material, TopicId, TopicSummary};
use tracing::{error, info};

use crate::error::{LearnerError, LearnerResult};
use crate::workspace::assistant::AiAssistant;
use crate::workspace::controller::TopicSession;
use crate::workspace::preferences::SidebarPrefs;
use crate::workspace::state::WorkspaceContext;
use crate::workspace::timer::StudyTimer;

const LOAD_FAILED: &str = "Failed to load course data. Please try again.";

pub struct CoursePage {
    course_id: CourseId,
    course: Option<Course>,
    materials: Vec<Material>,
    session: TopicSession,
    timer: StudyTimer,
    assistant: AiAssistant,
    sidebar: SidebarPrefs,
}

impl CoursePage {
    /// Loads the page for `course_id` and opens its first topic.
    ///
    /// A missing token fails the whole page. Any other read failure is notified
    /// and leaves the page populated with whatever loaded before it.
    pub async fn load(ctx: Arc<WorkspaceContext>, course_id: CourseId) -> LearnerResult<Self> {
        let auth = ctx.auth();
        if !auth.is_authenticated() {
            return Err(LearnerError::Unauthenticated);
        }

        let session = TopicSession::open(ctx.clone(), course_id);
        let mut page = Self {
            course_id,
            course: None,
            materials: Vec::new(),
            timer: StudyTimer::new(ctx.clone(), course_id, session.subscribe_topic()),
            assistant: AiAssistant::new(ctx.clone(), course_id, session.subscribe_topic()),
            sidebar: SidebarPrefs::load(ctx.store.clone()),
            session,
        };

        // Each read depends on the previous one succeeding.
        let course = match ctx.catalog.get_course(&auth, course_id).await {
            Ok(course) => course,
            Err(e) => {
                error!("Failed to load course {}: {}", course_id, e);
                ctx.report_failure(&e, LOAD_FAILED);
                return Ok(page);
            }
        };
        page.course = Some(course);

        match ctx.catalog.list_materials(&auth, course_id).await {
            Ok(materials) => page.materials = materials,
            Err(e) => {
                error!("Failed to load materials for course {}: {}", course_id, e);
                ctx.report_failure(&e, LOAD_FAILED);
                return Ok(page);
            }
        }

        let topics = match ctx.learning.list_topics(&auth, course_id).await {
            Ok(topics) => topics,
            Err(e) => {
                error!("Failed to load topics for course {}: {}", course_id, e);
                ctx.report_failure(&e, LOAD_FAILED);
                return Ok(page);
            }
        };
        let first = topics.first().map(|t| t.id.clone());
        page.session.set_topics(topics).await;

        if let Some(topic_id) = first {
            // Load failures are already notified by the session.
            if let Err(e) = page.session.load_topic(&topic_id).await {
                info!("Course page opened without topic content: {}", e);
            }
        }
        info!("Course page {} loaded", course_id);
        Ok(page)
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub async fn topics(&self) -> Vec<TopicSummary> {
        self.session.snapshot().await.topics
    }

    /// The selected topic's entry in the topic list.
    pub async fn current_topic(&self) -> Option<TopicSummary> {
        let snapshot = self.session.snapshot().await;
        let current = snapshot.topic_id?;
        snapshot.topics.into_iter().find(|t| t.id == current)
    }

    /// Percentage of completed topics.
    pub async fn progress(&self) -> u32 {
        course_progress(&self.session.snapshot().await.topics)
    }

    pub async fn change_topic(&self, topic_id: &TopicId) -> LearnerResult<()> {
        self.session.load_topic(topic_id).await
    }

    pub fn session(&self) -> &TopicSession {
        &self.session
    }

    pub fn timer(&self) -> &StudyTimer {
        &self.timer
    }

    pub fn assistant(&self) -> &AiAssistant {
        &self.assistant
    }

    pub fn sidebar(&self) -> &SidebarPrefs {
        &self.sidebar
    }

    pub fn sidebar_mut(&mut self) -> &mut SidebarPrefs {
        &mut self.sidebar
    }

    /// Tears the page down, saving unsaved notes. The study timer is discarded
    /// without a report.
    pub async fn close(self) -> LearnerResult<()> {
        self.timer.reset().await;
        self.session.shutdown().await
    }
}
