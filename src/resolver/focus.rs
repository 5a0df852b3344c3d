//! Single-task focus mode.
//!
//! `/focus` stages up to five High/Medium candidates and offers them as
//! buttons. Starting a session cancels any waiting delete confirmation.
//! While a session runs, every text message and voice transcript is
//! parked in its backlog unless it is a completion phrase. Ending the session, by
//! completion or `/cancel`, replays the backlog through item creation.

use tracing::{info, warn};

use super::{xp_line, InputSource, IntentResolver};
use crate::models::event::{Button, Reply};
use crate::models::item::{ItemStatus, ItemUpdate, Priority};
use crate::session::{FocusCandidate, FocusSession};

/// Prefix of the per-candidate button action ids.
pub const FOCUS_ACTION_PREFIX: &str = "focus_";

/// Action id of the picker's cancel button.
pub const FOCUS_CANCEL_ACTION: &str = "focus_cancel";

/// Most candidates offered at once.
pub const MAX_FOCUS_CANDIDATES: usize = 5;

const BUTTON_TITLE_CHARS: usize = 40;

const DONE_PHRASES: [&str; 6] = ["done", "finished", "complete", "completed", "تم", "خلص"];

/// Whether `text` ends a focus session.
#[must_use]
pub fn is_done_phrase(text: &str) -> bool {
    let text = text.trim().trim_end_matches(['!', '.']).to_lowercase();
    DONE_PHRASES.contains(&text.as_str())
}

impl IntentResolver {
    /// Offer focus candidates.
    pub async fn focus_picker(&self, user_id: &str) -> Reply {
        let items = self.items.list_active().await;
        if items.is_empty() {
            return Reply::text("No active tasks! Add some tasks first.");
        }
        let candidates: Vec<FocusCandidate> = items
            .into_iter()
            .filter(|item| item.priority.unwrap_or(Priority::Medium) != Priority::Low)
            .take(MAX_FOCUS_CANDIDATES)
            .map(|item| FocusCandidate {
                item_id: item.id,
                title: item.title,
                priority: item.priority,
                category: item.category,
            })
            .collect();
        if candidates.is_empty() {
            return Reply::text("No high priority tasks. Enjoy your break! ☕");
        }

        let mut buttons: Vec<Button> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let marker = match candidate.priority {
                    Some(Priority::High) => "🔴",
                    _ => "🟡",
                };
                let title = crate::util::truncate_chars(&candidate.title, BUTTON_TITLE_CHARS);
                Button::new(
                    format!("{marker} {title}"),
                    format!("{FOCUS_ACTION_PREFIX}{index}"),
                    index.to_string(),
                )
            })
            .collect();
        buttons.push(Button::new("❌ Cancel", FOCUS_CANCEL_ACTION, "cancel"));

        self.sessions.stage_focus_candidates(user_id, candidates);
        Reply::with_buttons("🧘 *Pick ONE task to focus on:*", buttons)
    }

    /// Start a session on the staged candidate at `index`.
    pub async fn choose_focus(&self, user_id: &str, index: usize) -> Vec<Reply> {
        let Some(candidate) = self.sessions.take_focus_candidate(user_id, index) else {
            return vec![Reply::text("Something went wrong. Try /focus again.")];
        };
        let session = FocusSession::new(candidate, self.clock.now());
        let title = session.title.clone();
        info!(user_id, item_id = %session.item_id, "focus session started");

        let mut replies: Vec<Reply> = self.deny_pending_delete(user_id).into_iter().collect();
        replies.push(Reply::text(format!(
            "🎯 *FOCUS MODE ACTIVE*\n\n📌 *{title}*\n\n\
             Everything else can wait. Say \"done\" when you finish.\n\
             Anything else you send is parked until then."
        )));
        if let Some(previous) = self.sessions.start_focus(user_id, session) {
            warn!(user_id, item_id = %previous.item_id, "focus session replaced");
            replies.extend(self.replay_backlog(user_id, previous.backlog).await);
        }
        replies
    }

    /// Drop the staged candidates without starting a session.
    #[must_use]
    pub fn cancel_picker(&self, user_id: &str) -> Reply {
        self.sessions.clear_focus_candidates(user_id);
        Reply::text("Focus mode cancelled. Back to chaos! 🌪️")
    }

    /// Handle text while a session runs. `None` when no session is active.
    pub async fn intercept_focus(&self, user_id: &str, text: &str) -> Option<Vec<Reply>> {
        let session = self.sessions.get_focus(user_id)?;
        if is_done_phrase(text) {
            return Some(self.complete_focus(user_id).await);
        }
        self.sessions.queue_during_focus(user_id, text);
        Some(vec![Reply::text(format!(
            "🧘 Still in Focus Mode on: *{}*\n\n📥 Parked for later. I'll file it when you're done.",
            session.title
        ))])
    }

    /// Finish the running session: mark the item done, log it, award XP,
    /// then replay the backlog.
    pub async fn complete_focus(&self, user_id: &str) -> Vec<Reply> {
        let Some(session) = self.sessions.end_focus(user_id) else {
            return vec![Reply::text("No active focus session. Start with /focus")];
        };
        if self
            .items
            .update_item(&session.item_id, &ItemUpdate::status(ItemStatus::Done))
            .await
            .is_none()
        {
            let title = session.title.clone();
            self.sessions.start_focus(user_id, session);
            return vec![Reply::text(format!(
                "❌ Couldn't mark *{title}* as done. Still focused; try \"done\" again."
            ))];
        }

        let minutes = (self.clock.now() - session.started_at).num_minutes().max(0);
        let minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
        self.progress
            .log(
                &session.title,
                &session.category,
                Some(minutes),
                "Focus session",
            )
            .await;
        let amount = self.rewards.focus_completed;
        let award = self.ledger.award(user_id, amount, "focus completed");
        info!(user_id, item_id = %session.item_id, minutes, "focus session completed");

        let mut replies = vec![Reply::text(format!(
            "🎉 *AMAZING!* You finished:\n\n✅ *{}*\n⏱️ {minutes} min\n\n{}",
            session.title,
            xp_line(&award, amount)
        ))];
        replies.extend(self.replay_backlog(user_id, session.backlog).await);
        replies
    }

    /// `/cancel`: leave focus mode, keeping parked messages.
    pub async fn cancel_focus(&self, user_id: &str) -> Vec<Reply> {
        let Some(session) = self.sessions.end_focus(user_id) else {
            return vec![Reply::text("No active focus session. Start with /focus")];
        };
        info!(user_id, item_id = %session.item_id, "focus session cancelled");
        let mut replies = vec![Reply::text(
            "Focus mode ended. No worries, you can try again anytime! 💪",
        )];
        replies.extend(self.replay_backlog(user_id, session.backlog).await);
        replies
    }

    async fn replay_backlog(&self, user_id: &str, backlog: Vec<String>) -> Vec<Reply> {
        if backlog.is_empty() {
            return Vec::new();
        }
        let mut replies = vec![Reply::text(format!(
            "📥 Filing {} parked message(s)...",
            backlog.len()
        ))];
        for text in backlog {
            replies.push(self.create_new(user_id, &text, InputSource::Text).await);
        }
        replies
    }
}
