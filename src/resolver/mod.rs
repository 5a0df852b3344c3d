//! Intent resolution.
//!
//! Every utterance walks the same short-circuiting chain: a pending delete
//! confirmation, then habit intents, then management intents, then new-item
//! creation. The resolver never sees transport or provider errors; the
//! adapters below it hand back typed outcomes only.

pub mod commands;
pub mod focus;
pub mod matcher;
pub mod media;
pub mod render;

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::FixedOffset;
use tracing::{debug, info, warn};

use crate::classifier::transcriber::Transcriber;
use crate::classifier::{AttachmentFlags, ClassificationAdapter};
use crate::clock::{today, Clock};
use crate::config::RewardConfig;
use crate::gamification::{Award, XpLedger};
use crate::models::event::{Button, Reply};
use crate::models::habit::NewHabit;
use crate::models::intent::{HabitIntent, ManagementIntent, MatchConfidence};
use crate::models::item::{Category, Item, ItemStatus, ItemUpdate, NewItem, Priority};
use crate::models::triage::{TriageEntry, TriageKind};
use crate::session::{ListCursor, ListKind, ListPage, PendingDelete, SessionStore};
use crate::store::habits::HabitStore;
use crate::store::items::ItemStore;
use crate::store::progress::ProgressLog;
use crate::store::triage::TriageStore;

use self::matcher::{resolve_target, MatchOutcome};

/// Action id of the "More" button under paginated lists.
pub const MORE_ACTION: &str = "list_more";

/// Most entries a natural-language query lists.
pub const QUERY_CAP: usize = 15;

const CONFIRM_WORDS: [&str; 5] = ["YES", "Y", "CONFIRM", "نعم", "اي"];

const ESCALATED_TEXT: &str = "⚠️ Something went wrong. Added to Brain Dump for manual processing.";
const LOST_TEXT: &str =
    "❌ Something went wrong and I couldn't save that anywhere. Please send it again.";
const DELETE_CANCELLED_TEXT: &str = "❌ Delete cancelled.";

/// How the utterance reached the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Typed text.
    Text,
    /// Transcribed voice note.
    Voice,
}

/// Collaborators the resolver is built from.
pub struct ResolverParts {
    /// Language-model front.
    pub classifier: ClassificationAdapter,
    /// Items database.
    pub items: ItemStore,
    /// Habits database, when configured.
    pub habits: Option<HabitStore>,
    /// Progress database.
    pub progress: ProgressLog,
    /// Manual-review capture.
    pub triage: TriageStore,
    /// Voice transcription.
    pub transcriber: Transcriber,
    /// XP ledger.
    pub ledger: Arc<XpLedger>,
    /// Per-user interaction state.
    pub sessions: Arc<SessionStore>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// XP amounts.
    pub rewards: RewardConfig,
    /// Weakest semantic match still accepted.
    pub min_confidence: MatchConfidence,
    /// Lines per page in paginated lists.
    pub list_page_size: usize,
    /// Reference timezone.
    pub offset: FixedOffset,
}

/// Decides what an utterance means and carries it out.
pub struct IntentResolver {
    classifier: ClassificationAdapter,
    items: ItemStore,
    habits: Option<HabitStore>,
    progress: ProgressLog,
    triage: TriageStore,
    transcriber: Transcriber,
    ledger: Arc<XpLedger>,
    sessions: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    rewards: RewardConfig,
    min_confidence: MatchConfidence,
    list_page_size: usize,
    offset: FixedOffset,
}

impl IntentResolver {
    /// Assemble a resolver.
    #[must_use]
    pub fn new(parts: ResolverParts) -> Self {
        Self {
            classifier: parts.classifier,
            items: parts.items,
            habits: parts.habits,
            progress: parts.progress,
            triage: parts.triage,
            transcriber: parts.transcriber,
            ledger: parts.ledger,
            sessions: parts.sessions,
            clock: parts.clock,
            rewards: parts.rewards,
            min_confidence: parts.min_confidence,
            list_page_size: parts.list_page_size.max(1),
            offset: parts.offset,
        }
    }

    /// Per-user state shared with the router.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Resolve one utterance and carry out the chosen action.
    pub async fn resolve_text(&self, user_id: &str, text: &str, source: InputSource) -> Vec<Reply> {
        if let Some(pending) = self.sessions.consume_pending_delete(user_id) {
            return vec![self.answer_pending_delete(user_id, pending, text).await];
        }

        if let Some(habits) = &self.habits {
            match self.classifier.classify_habit_intent(text).await {
                HabitIntent::None => {}
                HabitIntent::Create(habit) => return vec![self.create_habit(habits, habit).await],
                HabitIntent::Complete { name } => {
                    return vec![self.complete_habit(user_id, habits, &name).await];
                }
            }
        }

        let intent = self.classifier.classify_management_intent(text).await;
        debug!(
            user_id,
            intent = intent.label(),
            "management intent classified"
        );
        match intent {
            ManagementIntent::None => vec![self.create_new(user_id, text, source).await],
            ManagementIntent::Query { category } => {
                vec![self.query(user_id, category.as_deref()).await]
            }
            ManagementIntent::Delete { target } => {
                let item = match self.locate(&target).await {
                    Ok(item) => item,
                    Err(reply) => return vec![reply],
                };
                self.sessions.set_pending_delete(
                    user_id,
                    PendingDelete {
                        item_id: item.id.clone(),
                        title: item.title.clone(),
                    },
                );
                info!(user_id, item_id = %item.id, "delete awaiting confirmation");
                vec![Reply::text(format!(
                    "⚠️ Delete *{}*?\n\nReply YES to confirm, anything else to cancel.",
                    item.title
                ))]
            }
            ManagementIntent::Complete { target } => match self.locate(&target).await {
                Ok(item) => vec![self.complete_item(user_id, &item).await],
                Err(reply) => vec![reply],
            },
            ManagementIntent::UpdatePriority {
                target,
                new_priority,
            } => match self.locate(&target).await {
                Ok(item) => vec![self.reprioritize(&item, new_priority).await],
                Err(reply) => vec![reply],
            },
        }
    }

    /// Classify `text` as new content and file it, escalating to triage
    /// when the items database rejects the write.
    pub async fn create_new(&self, user_id: &str, text: &str, source: InputSource) -> Reply {
        let categorization = self.classifier.classify(text, AttachmentFlags::NONE).await;
        let notes = match source {
            InputSource::Text => categorization.summary.clone(),
            InputSource::Voice => format!("🎤 Voice note transcription:\n\n{text}"),
        };
        let item = NewItem::new(
            &categorization.title,
            categorization.category.clone(),
            categorization.item_type,
            categorization.priority,
            &notes,
        )
        .with_due(categorization.due);

        if self.items.create_item(&item).await.is_none() {
            let kind = match source {
                InputSource::Text => TriageKind::Text,
                InputSource::Voice => TriageKind::Voice,
            };
            return self
                .escalate(
                    user_id,
                    TriageEntry::new(text, kind).with_failure("Item store write failed"),
                )
                .await;
        }

        let amount = match source {
            InputSource::Text => self.rewards.task_added,
            InputSource::Voice => self.rewards.task_added + self.rewards.voice_note,
        };
        let award = self.ledger.award(user_id, amount, "item created");

        let mut reply = format!(
            "✅ Got it! Added to *{}*\n\n📌 {}\n🎯 Priority: {}\n",
            item.category,
            item.title,
            item.priority.label()
        );
        if let Some(due) = item.due {
            let _ = writeln!(reply, "📅 Due: {}", due.to_store_string());
        }
        if let Some(action) = categorization
            .suggested_action
            .filter(|a| !a.trim().is_empty())
        {
            let _ = write!(reply, "\n💡 Suggestion: {action}\n");
        }
        reply.push('\n');
        reply.push_str(&xp_line(&award, amount));
        Reply::text(reply)
    }

    async fn escalate(&self, user_id: &str, entry: TriageEntry) -> Reply {
        if self.triage.capture(user_id, &entry).await.preserved() {
            Reply::text(ESCALATED_TEXT)
        } else {
            warn!(user_id, "content could not be preserved");
            Reply::text(LOST_TEXT)
        }
    }

    /// Drop a waiting delete confirmation because the user moved on to
    /// something other than a text answer. The next text is then handled
    /// normally instead of being read as "no".
    pub fn deny_pending_delete(&self, user_id: &str) -> Option<Reply> {
        let pending = self.sessions.consume_pending_delete(user_id)?;
        info!(user_id, item_id = %pending.item_id, "delete cancelled by unrelated message");
        Some(Reply::text(DELETE_CANCELLED_TEXT))
    }

    async fn answer_pending_delete(
        &self,
        user_id: &str,
        pending: PendingDelete,
        answer: &str,
    ) -> Reply {
        if !is_affirmative(answer) {
            info!(user_id, item_id = %pending.item_id, "delete cancelled");
            return Reply::text(DELETE_CANCELLED_TEXT);
        }
        if self.items.archive_item(&pending.item_id).await {
            info!(user_id, item_id = %pending.item_id, "delete confirmed");
            Reply::text("✅ Deleted successfully!")
        } else {
            Reply::text("❌ Failed to delete. Try again.")
        }
    }

    async fn locate(&self, target: &str) -> std::result::Result<Item, Reply> {
        let items = self.items.list_active().await;
        match resolve_target(&self.classifier, &items, target, self.min_confidence).await {
            MatchOutcome::Found(item) => Ok(item),
            MatchOutcome::NoItems => Err(Reply::text("📋 No active items to manage.")),
            MatchOutcome::NotFound => Err(Reply::text(format!(
                "🔍 Couldn't find a matching task for '{target}'.\n\n\
                 💡 Try saying: /active to see all your tasks"
            ))),
        }
    }

    async fn complete_item(&self, user_id: &str, item: &Item) -> Reply {
        if self
            .items
            .update_item(&item.id, &ItemUpdate::status(ItemStatus::Done))
            .await
            .is_none()
        {
            return Reply::text(format!("❌ Couldn't update *{}*. Try again.", item.title));
        }
        self.progress
            .log(&item.title, &item.category, None, "Completed via chat")
            .await;
        let award = self
            .ledger
            .award(user_id, self.rewards.task_completed, "item completed");
        Reply::text(format!(
            "✅ Marked *{}* as Done!\n\n{}",
            item.title,
            xp_line(&award, self.rewards.task_completed)
        ))
    }

    async fn reprioritize(&self, item: &Item, priority: Option<Priority>) -> Reply {
        let Some(priority) = priority else {
            return Reply::text(format!(
                "🤔 Which priority should *{}* get? Try: \"make {} high priority\"",
                item.title, item.title
            ));
        };
        match self
            .items
            .update_item(&item.id, &ItemUpdate::priority(priority))
            .await
        {
            Some(_) => Reply::text(format!(
                "✅ Updated *{}* → Priority: {}",
                item.title,
                priority.label()
            )),
            None => Reply::text(format!("❌ Couldn't update *{}*. Try again.", item.title)),
        }
    }

    async fn query(&self, user_id: &str, category: Option<&str>) -> Reply {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let items = match category {
            Some(category) => self.items.list_by_category(category).await,
            None => self.items.list_active().await,
        };
        let header = match category {
            Some(category) if items.is_empty() => {
                return Reply::text(format!(
                    "No active items in {}.",
                    category_heading(category)
                ));
            }
            None if items.is_empty() => return Reply::text("📋 No active items."),
            Some(category) => format!(
                "📋 *{}* ({} items):",
                category_heading(category),
                items.len()
            ),
            None => format!("📋 *Active Items* ({}):", items.len()),
        };
        let lines = items
            .iter()
            .take(QUERY_CAP)
            .map(render::item_line)
            .collect();
        self.open_list(user_id, &header, ListKind::Query, lines)
    }

    async fn create_habit(&self, habits: &HabitStore, habit: NewHabit) -> Reply {
        if habits.create_habit(&habit).await.is_none() {
            return Reply::text("❌ Couldn't save that habit. Try again.");
        }
        let reward = habit
            .xp_reward
            .map_or(self.rewards.habit_default, u64::from);
        let mut text = format!(
            "🔁 New habit tracked: *{}*\n📆 {}",
            habit.name,
            habit.frequency.label()
        );
        if !habit.times.is_empty() {
            let times: Vec<&str> = habit.times.iter().map(|t| t.label()).collect();
            let _ = write!(text, " ({})", times.join(", "));
        }
        let _ = write!(text, "\n⭐ {reward} XP per completion");
        Reply::text(text)
    }

    async fn complete_habit(&self, user_id: &str, habits: &HabitStore, name: &str) -> Reply {
        let Some(habit) = habits.find_by_name(name).await else {
            return Reply::text(format!(
                "🤔 Couldn't find a habit matching '{name}'.\n\n💡 Try /habits to see your habits."
            ));
        };
        let day = today(self.clock.as_ref(), self.offset);
        if habit.completed_on(day, self.offset) {
            return Reply::text(format!(
                "✅ *{}* is already done today. See you tomorrow!",
                habit.name
            ));
        }
        if !habits.complete_habit(&habit.id).await {
            return Reply::text(format!("❌ Couldn't record *{}*. Try again.", habit.name));
        }
        self.progress
            .log(&habit.name, &habit.category, None, "Habit completed")
            .await;
        let amount = u64::from(habit.xp_reward);
        let award = self.ledger.award(user_id, amount, "habit completed");
        Reply::text(format!(
            "🎉 *{}* done!\n\n{}",
            habit.name,
            xp_line(&award, amount)
        ))
    }

    /// Next page of a paginated list, for the "More" button.
    #[must_use]
    pub fn more(&self, user_id: &str, list: Option<&str>) -> Reply {
        let page = list.and_then(ListKind::parse).and_then(|kind| {
            self.sessions
                .next_page(user_id, kind, self.list_page_size)
                .map(|page| (kind, page))
        });
        match page {
            Some((kind, page)) => page_reply("📋 *More:*", page, kind),
            None => Reply::text("That list has expired. Run /active again."),
        }
    }

    fn open_list(&self, user_id: &str, header: &str, kind: ListKind, lines: Vec<String>) -> Reply {
        let page =
            self.sessions
                .open_list(user_id, ListCursor::new(kind, lines), self.list_page_size);
        page_reply(header, page, kind)
    }
}

/// Whether `answer` confirms a pending action.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_uppercase();
    CONFIRM_WORDS.contains(&answer.as_str())
}

fn page_reply(header: &str, page: ListPage, kind: ListKind) -> Reply {
    let mut text = header.to_owned();
    for line in page.lines {
        text.push('\n');
        text.push_str(&line);
    }
    if page.has_more {
        Reply::with_buttons(
            text,
            vec![Button::new("➡️ More", MORE_ACTION, kind.as_str())],
        )
    } else {
        Reply::text(text)
    }
}

fn xp_line(award: &Award, amount: u64) -> String {
    let mut line = format!("⭐ +{amount} XP");
    if award.streak_bonus > 0 {
        let _ = write!(
            line,
            " (+{} streak bonus, {} days 🔥)",
            award.streak_bonus, award.record.streak_days
        );
    }
    if award.leveled_up {
        let _ = write!(
            line,
            "\n🎉 *Level up!* Level {}: {} {}",
            award.level.number, award.level.badge, award.level.title
        );
    }
    line
}

fn category_heading(raw: &str) -> String {
    Category::parse_known(raw).map_or_else(|| raw.trim().to_owned(), |c| c.label().to_owned())
}
