use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use learner_lib::adapters::{HttpLearningAdapter, JsonFileStore};
use learning_core::domain::{CourseId, QuizRequest, StudySessionReport, TopicId};
use learning_core::ports::{
    AuthContext, CourseCatalogService, KeyValueStore, LearningService, PortError, TOKEN_KEY,
};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
    hits: Arc<Mutex<usize>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer secret")
}

async fn get_topic(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Path(topic_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    *recorded.hits.lock().unwrap() += 1;
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no"})));
    }
    if topic_id == "500" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "data": {
                "id": topic_id,
                "title": "Heaps",
                "completed": true,
                "notes": [{"content": "# Heaps", "created_at": "2026-03-01T10:00:00"}]
            }
        })),
    )
}

async fn record_body(
    State(recorded): State<Recorded>,
    Path(topic_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.bodies.lock().unwrap().push((topic_id, body));
    Json(json!({"data": {}}))
}

async fn study_session(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded
        .bodies
        .lock()
        .unwrap()
        .push(("study-session".to_string(), body));
    Json(json!({"data": null}))
}

async fn malformed_quiz() -> Json<Value> {
    Json(json!({
        "data": {
            "questions": [{"question": "2+2?", "options": ["3", "4"], "correct_answer": 5}]
        }
    }))
}

async fn course_without_envelope() -> Json<Value> {
    Json(json!({"id": 1, "title": "No envelope"}))
}

async fn spawn_server(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/api/v1/learning/topics/{topic_id}", get(get_topic))
        .route("/api/v1/learning/topics/{topic_id}/notes", post(record_body))
        .route("/api/v1/learning/topics/{topic_id}/quiz", post(malformed_quiz))
        .route("/api/v1/learning/study-session", post(study_session))
        .route("/api/v1/courses/{course_id}", get(course_without_envelope))
        .with_state(recorded);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1/", addr)
}

fn auth_with(token: Option<&str>) -> AuthContext {
    let store = Arc::new(JsonFileStore::in_memory());
    if let Some(token) = token {
        store.set(TOKEN_KEY, token).unwrap();
    }
    AuthContext::new(store)
}

async fn adapter(recorded: Recorded) -> HttpLearningAdapter {
    let base_url = spawn_server(recorded).await;
    HttpLearningAdapter::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_topic_detail_is_unwrapped_from_envelope() {
    let http = adapter(Recorded::default()).await;

    let topic = http
        .get_topic(&auth_with(Some("secret")), &TopicId::new("12"))
        .await
        .unwrap();
    assert_eq!(topic.id, TopicId::new("12"));
    assert_eq!(topic.title, "Heaps");
    assert!(topic.completed);
    let note = topic.latest_note().unwrap();
    assert_eq!(note.content, "# Heaps");
    assert!(note.updated_at.is_some());
}

#[tokio::test]
async fn test_reserved_characters_in_ids_stay_in_one_segment() {
    let recorded = Recorded::default();
    let http = adapter(recorded.clone()).await;
    let auth = auth_with(Some("secret"));
    let topic_id = TopicId::new("unit 3/heaps?draft#2");

    let topic = http.get_topic(&auth, &topic_id).await.unwrap();
    assert_eq!(topic.id, topic_id);

    http.save_notes(&auth, &topic_id, "# Heaps").await.unwrap();
    let bodies = recorded.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![("unit 3/heaps?draft#2".to_string(), json!({"content": "# Heaps"}))]
    );
}

#[tokio::test]
async fn test_bodies_match_the_api() {
    let recorded = Recorded::default();
    let http = adapter(recorded.clone()).await;
    let auth = auth_with(Some("secret"));

    http.save_notes(&auth, &TopicId::new("12"), "# Heaps\n\nmin-heap")
        .await
        .unwrap();
    http.record_study_session(
        &auth,
        &StudySessionReport {
            course_id: CourseId(3),
            topic_id: Some(TopicId::new("12")),
            duration_seconds: 45,
        },
    )
    .await
    .unwrap();

    let bodies = recorded.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![
            ("12".to_string(), json!({"content": "# Heaps\n\nmin-heap"})),
            (
                "study-session".to_string(),
                json!({"course_id": 3, "topic_id": "12", "duration_seconds": 45})
            ),
        ]
    );
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let http = adapter(Recorded::default()).await;

    let result = http
        .get_topic(&auth_with(Some("stale")), &TopicId::new("12"))
        .await;
    assert_eq!(result.unwrap_err(), PortError::Unauthorized);
}

#[tokio::test]
async fn test_missing_token_never_reaches_the_server() {
    let recorded = Recorded::default();
    let http = adapter(recorded.clone()).await;

    let result = http.get_topic(&auth_with(None), &TopicId::new("12")).await;
    assert_eq!(result.unwrap_err(), PortError::Unauthorized);
    assert_eq!(*recorded.hits.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_server_errors_and_bad_shapes_are_reported() {
    let http = adapter(Recorded::default()).await;
    let auth = auth_with(Some("secret"));

    let failed = http.get_topic(&auth, &TopicId::new("500")).await;
    assert_eq!(failed.unwrap_err(), PortError::Status(500));

    let quiz = http
        .generate_quiz(
            &auth,
            &TopicId::new("12"),
            &QuizRequest::for_topic(CourseId(3)),
        )
        .await;
    assert!(matches!(quiz, Err(PortError::Malformed(_))));

    let course = http.get_course(&auth, CourseId(1)).await;
    assert!(matches!(course, Err(PortError::Malformed(_))));

    let missing = http.complete_topic(&auth, &TopicId::new("12")).await;
    assert!(matches!(missing, Err(PortError::NotFound(_))));
}
