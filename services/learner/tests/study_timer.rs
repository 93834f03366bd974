mod common;

use std::time::Duration;

use common::{Call, FakeBackend, Harness};
use learner_lib::workspace::{StudyReport, StudyTimer, TimerStop, TopicSession};
use learning_core::domain::{CourseId, TopicId};
use tokio::time::sleep;

async fn timer_on_topic(h: &Harness) -> (TopicSession, StudyTimer) {
    let session = TopicSession::open(h.ctx.clone(), CourseId(3));
    session.load_topic(&TopicId::new("a")).await.unwrap();
    let timer = StudyTimer::new(h.ctx.clone(), CourseId(3), session.subscribe_topic());
    (session, timer)
}

fn backend() -> FakeBackend {
    FakeBackend::with_topics(vec![common::topic("a", "Binary Trees", false, None)])
}

fn reports(h: &Harness) -> Vec<Call> {
    h.backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::RecordStudySession(..)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_long_session_is_reported_with_topic() {
    let h = Harness::new(backend());
    let (_session, timer) = timer_on_topic(&h).await;

    timer.start().await;
    sleep(Duration::from_secs(45)).await;
    assert_eq!(timer.display().await, "00:00:45");

    let stop = timer.stop().await.unwrap();
    assert_eq!(
        stop,
        TimerStop {
            elapsed_seconds: 45,
            report: StudyReport::Reported,
        }
    );
    assert_eq!(
        reports(&h),
        vec![Call::RecordStudySession(Some("a".to_string()), 45)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_short_session_is_not_reported() {
    let h = Harness::new(backend());
    let (_session, timer) = timer_on_topic(&h).await;

    timer.start().await;
    sleep(Duration::from_secs(10)).await;
    let stop = timer.stop().await.unwrap();

    assert_eq!(stop.report, StudyReport::BelowThreshold);
    assert_eq!(stop.elapsed_seconds, 10);
    assert!(reports(&h).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resume_continues_from_frozen_value() {
    let h = Harness::new(backend());
    let (_session, timer) = timer_on_topic(&h).await;

    timer.start().await;
    sleep(Duration::from_secs(10)).await;
    timer.stop().await.unwrap();

    sleep(Duration::from_secs(60)).await;
    assert_eq!(timer.elapsed_seconds().await, 10);
    assert!(!timer.is_active().await);

    timer.start().await;
    sleep(Duration::from_secs(5)).await;
    assert_eq!(timer.elapsed_seconds().await, 15);
    assert!(timer.is_active().await);
}

#[tokio::test(start_paused = true)]
async fn test_reset_zeroes_without_reporting() {
    let h = Harness::new(backend());
    let (_session, timer) = timer_on_topic(&h).await;

    timer.start().await;
    sleep(Duration::from_secs(40)).await;
    timer.reset().await;

    assert_eq!(timer.elapsed_seconds().await, 0);
    assert!(!timer.is_active().await);
    assert_eq!(timer.stop().await, None);
    assert!(reports(&h).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_report_keeps_elapsed_time() {
    let h = Harness::new(backend());
    h.backend.fail("record_study_session");
    let (_session, timer) = timer_on_topic(&h).await;

    timer.start().await;
    sleep(Duration::from_secs(40)).await;
    let stop = timer.stop().await.unwrap();

    assert_eq!(stop.report, StudyReport::Failed);
    assert_eq!(timer.elapsed_seconds().await, 40);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_publish_elapsed_seconds() {
    let h = Harness::new(backend());
    let (_session, timer) = timer_on_topic(&h).await;
    let ticks = timer.subscribe();

    timer.start().await;
    sleep(Duration::from_millis(3_500)).await;
    assert_eq!(*ticks.borrow(), 3);

    timer.reset().await;
    assert_eq!(*ticks.borrow(), 0);
}
