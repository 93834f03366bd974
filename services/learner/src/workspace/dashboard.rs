//! services/learner/src/workspace/dashboard.rs
//!
//! The dashboard: the user's course list, course creation with material
//! uploads, and logout.

use std::sync::Arc;

use learning_core::domain::{
    Course, CourseDraft, MaterialUpload, Notification, UploadOutcome, UploadStatus,
};
use learning_core::ports::{TOKEN_KEY, USER_KEY};
use tracing::{error, info};

use crate::error::{LearnerError, LearnerResult};
use crate::workspace::state::WorkspaceContext;

/// A newly created course and the per-file result of its material uploads.
#[derive(Debug, Clone)]
pub struct CreatedCourse {
    pub course: Course,
    pub uploads: Vec<UploadStatus>,
}

pub struct Dashboard {
    ctx: Arc<WorkspaceContext>,
}

impl Dashboard {
    pub fn new(ctx: Arc<WorkspaceContext>) -> Self {
        Self { ctx }
    }

    /// Lists the user's courses. Requires a stored token.
    pub async fn courses(&self) -> LearnerResult<Vec<Course>> {
        let auth = self.ctx.auth();
        if !auth.is_authenticated() {
            return Err(LearnerError::Unauthenticated);
        }
        self.ctx.catalog.list_courses(&auth).await.map_err(|e| {
            error!("Failed to fetch courses: {}", e);
            self.ctx
                .report_failure(&e, "Failed to fetch courses. Please try again.");
            LearnerError::from_port(e)
        })
    }

    /// Creates a course, then uploads each file to it.
    ///
    /// A failed upload is recorded against its file and does not stop the others.
    pub async fn create_course(
        &self,
        draft: &CourseDraft,
        files: Vec<MaterialUpload>,
    ) -> LearnerResult<CreatedCourse> {
        if !draft.is_complete() {
            return Err(LearnerError::InvalidInput(
                "a course needs a title, a domain and a level".to_string(),
            ));
        }

        let auth = self.ctx.auth();
        let course = self
            .ctx
            .catalog
            .create_course(&auth, draft)
            .await
            .map_err(|e| {
                error!("Failed to create course '{}': {}", draft.title, e);
                LearnerError::from_port(e)
            })?;
        info!("Created course {} ('{}')", course.id, course.title);

        let mut uploads = Vec::with_capacity(files.len());
        for file in files {
            let outcome = match self.ctx.catalog.upload_material(&auth, course.id, &file).await {
                Ok(material) => UploadOutcome::Uploaded(material),
                Err(e) => {
                    error!("Failed to upload {}: {}", file.file_name, e);
                    UploadOutcome::Failed(e.to_string())
                }
            };
            uploads.push(UploadStatus {
                file_name: file.file_name,
                outcome,
            });
        }

        self.ctx.notifier.notify(Notification::success(
            "Course created",
            "Your course has been created successfully.",
        ));
        Ok(CreatedCourse { course, uploads })
    }

    /// Stores the bearer token obtained from a login performed elsewhere.
    pub fn adopt_token(&self, token: &str) -> LearnerResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(LearnerError::InvalidInput("the token is empty".to_string()));
        }
        self.ctx.store.set(TOKEN_KEY, token)?;
        Ok(())
    }

    /// Forgets the stored credentials.
    pub fn logout(&self) -> LearnerResult<()> {
        self.ctx.store.remove(TOKEN_KEY)?;
        self.ctx.store.remove(USER_KEY)?;
        info!("Logged out.");
        Ok(())
    }
}
