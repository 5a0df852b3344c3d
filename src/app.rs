//! Application state and the per-event router.
//!
//! Every inbound event passes the allow-list, then the rate limiter, then
//! takes the user's request lock before it is routed. Replies are sent in
//! order once routing finishes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::transcriber::{SpeechToText, Transcriber};
use crate::classifier::{ClassificationAdapter, LanguageModel};
use crate::clock::Clock;
use crate::config::GlobalConfig;
use crate::frontend::ChatFrontEnd;
use crate::gamification::XpLedger;
use crate::models::event::{EventKind, InboundEvent, Reply};
use crate::models::triage::TriageKind;
use crate::persistence::journal_repo::JournalRepo;
use crate::resolver::focus::{FOCUS_ACTION_PREFIX, FOCUS_CANCEL_ACTION};
use crate::resolver::{InputSource, IntentResolver, ResolverParts, MORE_ACTION};
use crate::session::rate_limit::RateLimiter;
use crate::session::SessionStore;
use crate::store::habits::HabitStore;
use crate::store::items::ItemStore;
use crate::store::progress::ProgressLog;
use crate::store::triage::TriageStore;
use crate::store::PageBackend;

/// Reply sent when a user exceeds the rate limit.
pub const THROTTLED_TEXT: &str = "⏳ Too many requests. Please slow down a little.";

/// External collaborators the application is wired from.
pub struct Collaborators {
    /// Workspace page API.
    pub backend: Arc<dyn PageBackend>,
    /// Language model.
    pub model: Arc<dyn LanguageModel>,
    /// Speech-to-text engine.
    pub speech: Arc<dyn SpeechToText>,
    /// Local journal for triage entries the workspace rejected.
    pub journal: Option<JournalRepo>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Shared application state.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Intent resolver.
    pub resolver: Arc<IntentResolver>,
    /// Per-user interaction state.
    pub sessions: Arc<SessionStore>,
    /// XP ledger.
    pub ledger: Arc<XpLedger>,
    /// Per-user rate limiter.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire the stores, adapters and resolver from `config`.
    #[must_use]
    pub fn new(config: Arc<GlobalConfig>, parts: Collaborators) -> Self {
        let offset = config.reference_offset();
        let store_timeout = config.timeouts.store();
        let workspace = &config.workspace;

        let sessions = Arc::new(SessionStore::new());
        let ledger = Arc::new(XpLedger::new(Arc::clone(&parts.clock), offset));
        let habits = config
            .workspace
            .habits_db_id
            .as_deref()
            .filter(|_| config.habits_enabled())
            .map(|db_id| {
                HabitStore::new(
                    Arc::clone(&parts.backend),
                    db_id,
                    store_timeout,
                    Arc::clone(&parts.clock),
                    offset,
                    config.rewards.habit_default,
                )
            });

        let resolver = IntentResolver::new(ResolverParts {
            classifier: ClassificationAdapter::new(
                parts.model,
                config.timeouts.classification(),
                config.timeouts.vision(),
                offset,
            ),
            items: ItemStore::new(
                Arc::clone(&parts.backend),
                &workspace.items_db_id,
                store_timeout,
                Arc::clone(&parts.clock),
                offset,
            ),
            habits,
            progress: ProgressLog::new(
                Arc::clone(&parts.backend),
                &workspace.progress_db_id,
                store_timeout,
                Arc::clone(&parts.clock),
            ),
            triage: TriageStore::new(
                Arc::clone(&parts.backend),
                &workspace.triage_db_id,
                store_timeout,
                Arc::clone(&parts.clock),
                parts.journal,
            ),
            transcriber: Transcriber::new(parts.speech, config.timeouts.transcription()),
            ledger: Arc::clone(&ledger),
            sessions: Arc::clone(&sessions),
            clock: parts.clock,
            rewards: config.rewards.clone(),
            min_confidence: config.matching.min_confidence,
            list_page_size: config.list_page_size,
            offset,
        });

        Self {
            rate_limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            config,
            resolver: Arc::new(resolver),
            sessions,
            ledger,
        }
    }
}

/// What happened to one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Sender is not on the allow-list; nothing was sent.
    Ignored,
    /// Sender exceeded the rate limit; only the throttle notice was sent.
    Throttled,
    /// Routed; this many replies were produced.
    Handled(usize),
}

/// Process one inbound event end to end.
pub async fn handle_event(
    state: &AppState,
    front_end: &dyn ChatFrontEnd,
    event: InboundEvent,
) -> EventOutcome {
    let user_id = event.user_id.as_str();
    if let Err(err) = state.config.ensure_authorized(user_id) {
        warn!(user_id, kind = event.kind.label(), %err, "ignoring event from unauthorized user");
        return EventOutcome::Ignored;
    }
    if let Err(err) = state.rate_limiter.check(user_id) {
        info!(user_id, %err, "event throttled");
        deliver(front_end, &event.channel, vec![Reply::text(THROTTLED_TEXT)]).await;
        return EventOutcome::Throttled;
    }

    let _guard = state.sessions.lock_user(user_id).await;
    debug!(user_id, kind = event.kind.label(), "routing event");
    let replies = route(state, front_end, &event).await;
    let count = replies.len();
    deliver(front_end, &event.channel, replies).await;
    EventOutcome::Handled(count)
}

async fn route(state: &AppState, front_end: &dyn ChatFrontEnd, event: &InboundEvent) -> Vec<Reply> {
    let resolver = &state.resolver;
    let user_id = event.user_id.as_str();

    match &event.kind {
        EventKind::Text(text) => {
            if let Some(replies) = resolver.intercept_focus(user_id, text).await {
                return replies;
            }
            working(front_end, &event.channel).await;
            resolver
                .resolve_text(user_id, text, InputSource::Text)
                .await
        }
        EventKind::Voice { file } => {
            working(front_end, &event.channel).await;
            match front_end.fetch_file(file).await {
                Ok(audio) => resolver.handle_voice(user_id, file, audio).await,
                Err(err) => {
                    warn!(user_id, %err, "voice download failed");
                    let mut replies = implicit_denial(resolver, user_id);
                    replies.push(
                        resolver
                            .capture_undownloadable(user_id, file, TriageKind::Voice)
                            .await,
                    );
                    replies
                }
            }
        }
        EventKind::Photo { file, caption } => {
            working(front_end, &event.channel).await;
            let mut replies = implicit_denial(resolver, user_id);
            let reply = match front_end.fetch_file(file).await {
                Ok(image) => {
                    resolver
                        .handle_photo(user_id, file, image, caption.as_deref())
                        .await
                }
                Err(err) => {
                    warn!(user_id, %err, "photo download failed");
                    resolver
                        .capture_undownloadable(user_id, file, TriageKind::Image)
                        .await
                }
            };
            replies.push(reply);
            replies
        }
        EventKind::Document { file, caption } => {
            working(front_end, &event.channel).await;
            let mut replies = implicit_denial(resolver, user_id);
            replies.push(
                resolver
                    .handle_document(user_id, file, caption.as_deref())
                    .await,
            );
            replies
        }
        EventKind::ButtonPress { action_id, value } => {
            route_button(resolver, user_id, action_id, value.as_deref()).await
        }
        EventKind::Command { name, args } => resolver.command(user_id, name, args).await,
    }
}

/// Files and failed voice notes are never a yes/no answer; they cancel a
/// waiting delete so the next text is handled on its own.
fn implicit_denial(resolver: &IntentResolver, user_id: &str) -> Vec<Reply> {
    resolver.deny_pending_delete(user_id).into_iter().collect()
}

async fn route_button(
    resolver: &IntentResolver,
    user_id: &str,
    action_id: &str,
    value: Option<&str>,
) -> Vec<Reply> {
    if action_id == FOCUS_CANCEL_ACTION {
        return vec![resolver.cancel_picker(user_id)];
    }
    if action_id == MORE_ACTION {
        return vec![resolver.more(user_id, value)];
    }
    if let Some(raw) = action_id.strip_prefix(FOCUS_ACTION_PREFIX) {
        return match raw.parse::<usize>() {
            Ok(index) => resolver.choose_focus(user_id, index).await,
            Err(_) => vec![Reply::text("Something went wrong. Try /focus again.")],
        };
    }
    debug!(user_id, action_id, "unrecognized button action");
    Vec::new()
}

async fn working(front_end: &dyn ChatFrontEnd, channel: &str) {
    if let Err(err) = front_end.indicate_progress(channel).await {
        debug!(%err, "progress indicator failed");
    }
}

async fn deliver(front_end: &dyn ChatFrontEnd, channel: &str, replies: Vec<Reply>) {
    for reply in replies {
        if let Err(err) = front_end.send(channel, reply).await {
            warn!(channel, %err, "failed to deliver reply");
        }
    }
}
