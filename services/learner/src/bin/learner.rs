//! services/learner/src/bin/learner.rs

use learner_lib::{
    adapters::{ChannelNotifier, HttpLearningAdapter, JsonFileStore},
    config::Config,
    error::{LearnerError, LearnerResult},
    workspace::{
        CompletionOutcome, CoursePage, Dashboard, GenerationOutcome, QuizPhase, SaveOutcome,
        StudyReport, WorkspaceContext,
    },
};
use learning_core::domain::{AssistantMode, CourseId, Notification, NotificationKind, TopicId};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  token <value>             store a bearer token obtained at login
  courses                   list your courses
  course <id>               open a course page
  topic <id>                switch to a topic
  edit <text>               append a line to the notes
  save                      save the notes now
  complete                  mark the current topic as completed
  quiz                      generate a quiz for the current topic
  answer <question> <option>  pick an answer (1-based)
  submit                    submit the quiz
  back                      return to the notes
  timer start|stop|reset    control the study timer
  ask <question>            ask the assistant
  explain <concept>         ask the assistant to explain a concept
  logout                    forget the stored credentials
  quit                      save and exit";

enum Flow {
    Continue,
    Quit,
}

struct Host {
    ctx: Arc<WorkspaceContext>,
    dashboard: Dashboard,
    page: Option<CoursePage>,
}

impl Host {
    async fn dispatch(&mut self, line: &str) -> LearnerResult<Flow> {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => {}
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(Flow::Quit),
            "token" => {
                self.dashboard.adopt_token(rest)?;
                println!("Token stored.");
            }
            "logout" => {
                self.close_page().await;
                self.dashboard.logout()?;
                println!("Logged out.");
            }
            "courses" => {
                for course in self.dashboard.courses().await? {
                    println!("  [{}] {}", course.id, course.title);
                }
            }
            "course" => {
                let course_id = CourseId(parse_arg(rest, "course id")?);
                self.close_page().await;
                let page = CoursePage::load(self.ctx.clone(), course_id).await?;
                print_page(&page).await;
                self.page = Some(page);
            }
            "topic" => {
                let page = self.page()?;
                page.change_topic(&TopicId::new(rest)).await?;
                print_page(page).await;
            }
            "edit" => {
                let session = self.page()?.session();
                let mut notes = session.snapshot().await.notes;
                notes.push('\n');
                notes.push_str(rest);
                session.edit_notes(notes).await;
            }
            "save" => match self.page()?.session().save().await? {
                SaveOutcome::Saved => println!("Saved."),
                SaveOutcome::SkippedBlank => println!("Nothing to save."),
                SaveOutcome::SkippedClean | SaveOutcome::NoTopic => {}
            },
            "complete" => {
                let page = self.page()?;
                let topic = page
                    .current_topic()
                    .await
                    .ok_or_else(|| LearnerError::InvalidState("no topic selected".to_string()))?;
                if page.session().mark_completed(&topic.id).await?
                    == CompletionOutcome::AlreadyCompleted
                {
                    println!("Already completed.");
                }
                println!("Progress: {}%", page.progress().await);
            }
            "quiz" => {
                let session = self.page()?.session();
                if session.generate_quiz().await? == GenerationOutcome::Ready {
                    print_quiz(&session.snapshot().await.quiz);
                }
            }
            "answer" => {
                let mut args = rest.split_whitespace();
                let question: usize = parse_arg(args.next().unwrap_or(""), "question")?;
                let option: usize = parse_arg(args.next().unwrap_or(""), "option")?;
                let session = self.page()?.session();
                session
                    .select_answer(question.saturating_sub(1), option.saturating_sub(1))
                    .await?;
                if session.can_submit().await {
                    println!("All questions answered. Type `submit` when ready.");
                }
            }
            "submit" => {
                let result = self.page()?.session().submit_quiz().await?;
                println!("{}", result.summary());
            }
            "back" => self.page()?.session().back_to_notes().await,
            "timer" => {
                let timer = self.page()?.timer();
                match rest {
                    "start" => timer.start().await,
                    "stop" => match timer.stop().await {
                        Some(stop) if stop.report == StudyReport::Reported => {
                            println!("Studied {}s, session recorded.", stop.elapsed_seconds)
                        }
                        Some(stop) => println!("Studied {}s.", stop.elapsed_seconds),
                        None => println!("The timer is not running."),
                    },
                    "reset" => timer.reset().await,
                    _ => println!("{}", timer.display().await),
                }
            }
            "ask" | "explain" => {
                let assistant = self.page()?.assistant();
                let mode = if command == "ask" {
                    AssistantMode::Chat
                } else {
                    AssistantMode::Explain
                };
                assistant.set_mode(mode).await;
                if let Some(reply) = assistant.send(rest).await? {
                    println!("{}", reply);
                }
            }
            other => println!("Unknown command '{}'. Type `help`.", other),
        }
        Ok(Flow::Continue)
    }

    fn page(&self) -> LearnerResult<&CoursePage> {
        self.page
            .as_ref()
            .ok_or_else(|| LearnerError::InvalidState("open a course first".to_string()))
    }

    async fn close_page(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                error!("Failed to save notes while closing the course: {}", e);
            }
        }
    }
}

fn parse_arg<T: std::str::FromStr>(raw: &str, what: &str) -> LearnerResult<T> {
    raw.parse()
        .map_err(|_| LearnerError::InvalidInput(format!("invalid {}: '{}'", what, raw)))
}

async fn print_page(page: &CoursePage) {
    if let Some(course) = page.course() {
        println!("== {} ==", course.title);
    }
    for topic in page.topics().await {
        let mark = if topic.completed { "x" } else { " " };
        println!("  [{}] {} {}", mark, topic.id, topic.title);
    }
    println!("Progress: {}%", page.progress().await);
    let snapshot = page.session().snapshot().await;
    if snapshot.topic.is_some() {
        println!("\n{}\n", snapshot.notes);
    }
    if let Some(status) = page.session().save_status().await {
        println!("({})", status);
    }
}

fn print_quiz(phase: &QuizPhase) {
    let QuizPhase::Active { quiz, .. } = phase else {
        return;
    };
    for (index, question) in quiz.questions.iter().enumerate() {
        println!("{}. {}", index + 1, question.prompt);
        for (option_index, option) in question.options.iter().enumerate() {
            println!("   {}) {}", option_index + 1, option);
        }
    }
}

fn print_notification(notification: &Notification) {
    let tag = match notification.kind {
        NotificationKind::Info => "info",
        NotificationKind::Success => "ok",
        NotificationKind::Error => "error",
        NotificationKind::LoginRequired => "login",
    };
    println!("[{}] {}: {}", tag, notification.title, notification.description);
}

async fn run(mut host: Host, mut notifications: UnboundedReceiver<Notification>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => print_notification(&notification),
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                };
                match host.dispatch(&line).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(LearnerError::Unauthenticated) => {
                        println!("You are not logged in. Use `token <value>` first.")
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    host.close_page().await;
    while let Ok(notification) = notifications.try_recv() {
        print_notification(&notification);
    }
}

#[tokio::main]
async fn main() -> Result<(), LearnerError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Talking to {}", config.api_base_url);

    // --- 2. Initialize Adapters ---
    let store = Arc::new(JsonFileStore::open(&config.store_path)?);
    let http = Arc::new(HttpLearningAdapter::new(
        config.api_base_url.clone(),
        config.request_timeout,
    )?);
    let (notifier, notifications) = ChannelNotifier::new();

    // --- 3. Build the Shared Context ---
    let ctx = Arc::new(WorkspaceContext {
        catalog: http.clone(),
        learning: http.clone(),
        assistant: http,
        store,
        notifier: Arc::new(notifier),
        timing: config.timing,
    });

    // --- 4. Run the Command Loop ---
    println!("{}", HELP);
    let host = Host {
        dashboard: Dashboard::new(ctx.clone()),
        ctx,
        page: None,
    };
    run(host, notifications).await;
    info!("Bye.");
    Ok(())
}
