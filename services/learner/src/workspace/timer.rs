//! services/learner/src/workspace/timer.rs
//!
//! A start/stop/reset study stopwatch that reports sessions long enough to count.

use std::sync::Arc;
use std::time::Duration;

use learning_core::domain::{format_clock, CourseId, StudySessionReport, TopicId};
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info};

use crate::workspace::state::WorkspaceContext;

/// What happened to the session when the timer was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyReport {
    Reported,
    /// The report request failed. The elapsed time is kept on the timer.
    Failed,
    BelowThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStop {
    pub elapsed_seconds: u64,
    pub report: StudyReport,
}

#[derive(Default)]
struct TimerState {
    /// Whole seconds accumulated before the current run.
    base_seconds: u64,
    /// Start of the current run; `None` while stopped.
    resumed_at: Option<Instant>,
    ticker: Option<CancellationToken>,
}

impl TimerState {
    fn elapsed_seconds(&self) -> u64 {
        elapsed_since(self.base_seconds, self.resumed_at)
    }

    fn halt_ticker(&mut self) {
        if let Some(token) = self.ticker.take() {
            token.cancel();
        }
    }
}

fn elapsed_since(base_seconds: u64, resumed_at: Option<Instant>) -> u64 {
    match resumed_at {
        Some(at) => base_seconds + at.elapsed().as_secs(),
        None => base_seconds,
    }
}

pub struct StudyTimer {
    ctx: Arc<WorkspaceContext>,
    course_id: CourseId,
    topic: watch::Receiver<Option<TopicId>>,
    state: Mutex<TimerState>,
    elapsed_tx: Arc<watch::Sender<u64>>,
    shutdown: CancellationToken,
    _guard: DropGuard,
}

impl StudyTimer {
    /// `topic` follows the workspace's current topic, which is attached to reports.
    pub fn new(
        ctx: Arc<WorkspaceContext>,
        course_id: CourseId,
        topic: watch::Receiver<Option<TopicId>>,
    ) -> Self {
        let (elapsed_tx, _) = watch::channel(0);
        let shutdown = CancellationToken::new();
        Self {
            ctx,
            course_id,
            topic,
            state: Mutex::new(TimerState::default()),
            elapsed_tx: Arc::new(elapsed_tx),
            _guard: shutdown.clone().drop_guard(),
            shutdown,
        }
    }

    /// Starts or resumes counting from the current elapsed value.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.resumed_at.is_some() {
            return;
        }
        let resumed_at = Instant::now();
        state.resumed_at = Some(resumed_at);

        let token = self.shutdown.child_token();
        state.ticker = Some(token.clone());
        tokio::spawn(publish_ticks(
            self.elapsed_tx.clone(),
            state.base_seconds,
            resumed_at,
            self.ctx.timing.timer_tick,
            token,
        ));
        info!("Study timer started at {}", format_clock(state.base_seconds));
    }

    /// Freezes the timer and reports the session when it reached the minimum length.
    ///
    /// Returns `None` when the timer was not running.
    pub async fn stop(&self) -> Option<TimerStop> {
        let elapsed_seconds = {
            let mut state = self.state.lock().await;
            if state.resumed_at.is_none() {
                return None;
            }
            let elapsed = state.elapsed_seconds();
            state.base_seconds = elapsed;
            state.resumed_at = None;
            state.halt_ticker();
            elapsed
        };
        self.elapsed_tx.send_replace(elapsed_seconds);

        if elapsed_seconds < self.ctx.timing.min_study_session.as_secs() {
            debug!("Study session of {}s is too short to report.", elapsed_seconds);
            return Some(TimerStop {
                elapsed_seconds,
                report: StudyReport::BelowThreshold,
            });
        }

        let report = StudySessionReport {
            course_id: self.course_id,
            topic_id: self.topic.borrow().clone(),
            duration_seconds: elapsed_seconds,
        };
        let outcome = match self
            .ctx
            .learning
            .record_study_session(&self.ctx.auth(), &report)
            .await
        {
            Ok(()) => {
                info!("Recorded a study session of {}s", elapsed_seconds);
                StudyReport::Reported
            }
            Err(e) => {
                error!("Failed to record study session: {}", e);
                StudyReport::Failed
            }
        };
        Some(TimerStop {
            elapsed_seconds,
            report: outcome,
        })
    }

    /// Stops counting and zeroes the timer without reporting.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.halt_ticker();
        state.base_seconds = 0;
        state.resumed_at = None;
        self.elapsed_tx.send_replace(0);
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.resumed_at.is_some()
    }

    /// Live while running, frozen while stopped.
    pub async fn elapsed_seconds(&self) -> u64 {
        self.state.lock().await.elapsed_seconds()
    }

    pub async fn display(&self) -> String {
        format_clock(self.elapsed_seconds().await)
    }

    /// Receives the elapsed seconds once per tick while running.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed_tx.subscribe()
    }
}

async fn publish_ticks(
    elapsed_tx: Arc<watch::Sender<u64>>,
    base_seconds: u64,
    resumed_at: Instant,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = interval_at(resumed_at + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                elapsed_tx.send_replace(elapsed_since(base_seconds, Some(resumed_at)));
            }
        }
    }
}
