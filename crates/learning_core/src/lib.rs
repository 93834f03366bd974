pub mod domain;
pub mod ports;

pub use domain::{
    AssistantMode, AssistantQuery, ChatMessage, ChatRole, Course, CourseDraft, CourseId,
    Material, MaterialUpload, Note, Notification, NotificationKind, Objective, OptionMark, Quiz,
    QuizAnswerSet, QuizQuestion, QuizRequest, QuizResult, StudySessionReport, TopicDetail,
    TopicId, TopicSummary, UploadOutcome, UploadStatus,
};
pub use ports::{
    AssistantService, AuthContext, CourseCatalogService, KeyValueStore, LearningService,
    Notifier, PortError, PortResult,
};
