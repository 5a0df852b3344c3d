//! Shared test helpers for resolver- and router-level integration tests.
//!
//! Provides scripted fakes for every external collaborator (language
//! model, speech engine, chat front end) plus a [`Harness`] that wires a
//! complete `AppState` over an in-memory workspace, so individual test
//! modules can focus on behaviour rather than boilerplate.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use life_organizer::app::{handle_event, AppState, Collaborators, EventOutcome};
use life_organizer::classifier::transcriber::SpeechToText;
use life_organizer::classifier::{CompletionRequest, LanguageModel, ModelTask};
use life_organizer::clock::FixedClock;
use life_organizer::config::GlobalConfig;
use life_organizer::frontend::ChatFrontEnd;
use life_organizer::models::event::{EventKind, FileRef, InboundEvent, Reply};
use life_organizer::persistence::db;
use life_organizer::persistence::journal_repo::JournalRepo;
use life_organizer::store::items::{PROP_CATEGORY, PROP_NAME, PROP_PRIORITY, PROP_STATUS};
use life_organizer::store::memory::MemoryBackend;
use life_organizer::store::properties::{date, select, title};
use life_organizer::store::Properties;
use life_organizer::{AppError, Result};

/// The one allow-listed user.
pub const OWNER: &str = "U_OWNER";

/// Conversation every reply goes to.
pub const CHANNEL: &str = "D_OWNER";

/// Database identifiers used by [`test_config`].
pub const ITEMS_DB: &str = "items-db";
pub const TRIAGE_DB: &str = "triage-db";
pub const PROGRESS_DB: &str = "progress-db";
pub const HABITS_DB: &str = "habits-db";

/// Build a `GlobalConfig` with every database configured, a small page
/// size and a generous rate limit. `extra` is appended verbatim.
pub fn test_config(extra: &str) -> GlobalConfig {
    let toml = format!(
        r#"
authorized_user_ids = ["{OWNER}"]
list_page_size = 3

[workspace]
items_db_id = "{ITEMS_DB}"
triage_db_id = "{TRIAGE_DB}"
progress_db_id = "{PROGRESS_DB}"
habits_db_id = "{HABITS_DB}"

{extra}
"#
    );
    GlobalConfig::from_toml_str(&toml).expect("valid test config")
}

/// Morning of 2026-03-10, UTC.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
}

/// Language model answering from per-task queues. An empty queue answers
/// with a provider error, so every unscripted call takes its fallback.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<HashMap<ModelTask, VecDeque<Option<String>>>>,
    calls: Mutex<Vec<ModelTask>>,
}

impl ScriptedModel {
    /// Queue a raw reply for `task`.
    pub fn reply(&self, task: ModelTask, raw: &str) {
        self.replies
            .lock()
            .unwrap()
            .entry(task)
            .or_default()
            .push_back(Some(raw.to_owned()));
    }

    /// Queue a provider failure for `task`.
    pub fn fail(&self, task: ModelTask) {
        self.replies
            .lock()
            .unwrap()
            .entry(task)
            .or_default()
            .push_back(None);
    }

    /// How often `task` was asked.
    pub fn calls(&self, task: ModelTask) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t == task)
            .count()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        self.calls.lock().unwrap().push(request.task);
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&request.task)
            .and_then(VecDeque::pop_front)
            .flatten();
        Box::pin(async move { next.ok_or_else(|| AppError::Classifier("scripted failure".into())) })
    }
}

/// Speech engine returning a fixed transcript, or failing when none is set.
#[derive(Default)]
pub struct ScriptedSpeech {
    transcript: Mutex<Option<String>>,
}

impl ScriptedSpeech {
    /// Answer every request with `text`.
    pub fn set(&self, text: &str) {
        *self.transcript.lock().unwrap() = Some(text.to_owned());
    }
}

impl SpeechToText for ScriptedSpeech {
    fn transcribe(
        &self,
        _audio: Bytes,
        _filename: &str,
        _mime: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let transcript = self.transcript.lock().unwrap().clone();
        Box::pin(async move {
            transcript.ok_or_else(|| AppError::Transcription("scripted failure".into()))
        })
    }
}

/// Chat front end that records what it is asked to do and serves file
/// bytes registered by id.
#[derive(Default)]
pub struct RecordingFrontEnd {
    sent: Mutex<Vec<(String, Reply)>>,
    files: Mutex<HashMap<String, Bytes>>,
    progress: AtomicUsize,
}

impl RecordingFrontEnd {
    /// Serve `bytes` for file `id`.
    pub fn host_file(&self, id: &str, bytes: &'static [u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(id.to_owned(), Bytes::from_static(bytes));
    }

    /// Drain every reply sent so far.
    pub fn take(&self) -> Vec<Reply> {
        self.sent
            .lock()
            .unwrap()
            .drain(..)
            .map(|(_, reply)| reply)
            .collect()
    }

    /// Channels replies went to, in order.
    pub fn channels(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(channel, _)| channel.clone())
            .collect()
    }

    /// Progress indications so far.
    pub fn progress_calls(&self) -> usize {
        self.progress.load(Ordering::SeqCst)
    }
}

impl ChatFrontEnd for RecordingFrontEnd {
    fn send(
        &self,
        channel: &str,
        reply: Reply,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.sent.lock().unwrap().push((channel.to_owned(), reply));
        Box::pin(async { Ok(()) })
    }

    fn fetch_file(
        &self,
        file: &FileRef,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + '_>> {
        let hosted = self.files.lock().unwrap().get(&file.id).cloned();
        let id = file.id.clone();
        Box::pin(async move { hosted.ok_or_else(|| AppError::Slack(format!("no such file {id}"))) })
    }

    fn indicate_progress(
        &self,
        _channel: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.progress.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

/// Fully wired application over fakes.
pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub model: Arc<ScriptedModel>,
    pub speech: Arc<ScriptedSpeech>,
    pub clock: Arc<FixedClock>,
    pub front_end: RecordingFrontEnd,
    pub journal: JournalRepo,
    pub state: AppState,
}

impl Harness {
    /// Harness over [`test_config`] with no extra settings.
    pub async fn new() -> Self {
        Self::with_config(test_config("")).await
    }

    /// Harness over `config`.
    pub async fn with_config(config: GlobalConfig) -> Self {
        let clock = Arc::new(FixedClock::new(start_instant()));
        let backend = Arc::new(MemoryBackend::with_clock(clock.clone()));
        let model = Arc::new(ScriptedModel::default());
        let speech = Arc::new(ScriptedSpeech::default());
        let pool = db::connect_memory().await.expect("in-memory db");
        let journal = JournalRepo::new(Arc::new(pool));

        let state = AppState::new(
            Arc::new(config),
            Collaborators {
                backend: backend.clone(),
                model: model.clone(),
                speech: speech.clone(),
                journal: Some(journal.clone()),
                clock: clock.clone(),
            },
        );

        Self {
            backend,
            model,
            speech,
            clock,
            front_end: RecordingFrontEnd::default(),
            journal,
            state,
        }
    }

    /// Route `event` through the full pipeline.
    pub async fn dispatch(&self, event: InboundEvent) -> EventOutcome {
        handle_event(&self.state, &self.front_end, event).await
    }

    /// Send a text message as the owner and return the replies.
    pub async fn say(&self, text: &str) -> Vec<Reply> {
        self.dispatch(InboundEvent::text(OWNER, CHANNEL, text))
            .await;
        self.front_end.take()
    }

    /// Run a slash command as the owner and return the replies.
    pub async fn command(&self, name: &str, args: &str) -> Vec<Reply> {
        self.dispatch(owner_event(EventKind::Command {
            name: name.to_owned(),
            args: args.to_owned(),
        }))
        .await;
        self.front_end.take()
    }

    /// Press a button as the owner and return the replies.
    pub async fn press(&self, action_id: &str, value: &str) -> Vec<Reply> {
        self.dispatch(owner_event(EventKind::ButtonPress {
            action_id: action_id.to_owned(),
            value: Some(value.to_owned()),
        }))
        .await;
        self.front_end.take()
    }

    /// Insert an active item directly into the items database.
    pub fn seed_item(&self, name: &str, category: &str, priority: &str) -> String {
        self.seed_item_with_status(name, category, priority, "Active")
    }

    /// Insert an item with an explicit status.
    pub fn seed_item_with_status(
        &self,
        name: &str,
        category: &str,
        priority: &str,
        status: &str,
    ) -> String {
        let mut props = Properties::new();
        props.insert(PROP_NAME.into(), title(name));
        props.insert(PROP_CATEGORY.into(), select(category));
        props.insert(PROP_PRIORITY.into(), select(priority));
        props.insert(PROP_STATUS.into(), select(status));
        self.backend.seed(ITEMS_DB, props)
    }

    /// Insert an active item with a due date.
    pub fn seed_deadline(&self, name: &str, due: &str) -> String {
        let mut props = Properties::new();
        props.insert(PROP_NAME.into(), title(name));
        props.insert(PROP_CATEGORY.into(), select("Study"));
        props.insert(PROP_STATUS.into(), select("Active"));
        props.insert("Due Date".into(), date(due));
        self.backend.seed(ITEMS_DB, props)
    }

    /// Status label currently stored on `page_id`.
    pub fn status_of(&self, page_id: &str) -> Option<String> {
        let page = self.backend.page(page_id)?;
        life_organizer::store::properties::read_select(&page.properties, PROP_STATUS)
    }
}

/// Event from the owner in the owner's channel.
pub fn owner_event(kind: EventKind) -> InboundEvent {
    InboundEvent {
        user_id: OWNER.to_owned(),
        channel: CHANNEL.to_owned(),
        kind,
    }
}

/// File reference with a fake download URL.
pub fn file(id: &str, name: &str, mimetype: &str) -> FileRef {
    FileRef {
        id: id.to_owned(),
        name: name.to_owned(),
        mimetype: mimetype.to_owned(),
        url: format!("https://files.example.test/{id}"),
    }
}

/// Concatenated reply texts.
pub fn joined(replies: &[Reply]) -> String {
    replies
        .iter()
        .map(|reply| reply.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n")
}
