//! Slash commands.

use tracing::debug;

use super::{render, IntentResolver};
use crate::clock::today;
use crate::models::event::Reply;
use crate::session::ListKind;

/// Deadlines shown by `/deadlines`.
pub const DEADLINE_LIMIT: usize = 5;

impl IntentResolver {
    /// Run the command `name` (without the slash).
    pub async fn command(&self, user_id: &str, name: &str, args: &str) -> Vec<Reply> {
        let name = name.trim().trim_start_matches('/').to_lowercase();
        debug!(user_id, command = %name, "command received");
        match name.as_str() {
            "start" => vec![Reply::text(render::START_TEXT)],
            "help" => vec![Reply::text(render::HELP_TEXT)],
            "active" if !args.trim().is_empty() => {
                vec![self.query(user_id, Some(args)).await]
            }
            "active" => vec![self.active_list(user_id).await],
            "stats" => vec![Reply::text(render::stats(&self.ledger.get(user_id)))],
            "weekly" => {
                let items = self.items.list_active().await;
                vec![Reply::text(render::weekly(
                    &items,
                    &self.ledger.get(user_id),
                ))]
            }
            "focus" => vec![self.focus_picker(user_id).await],
            "cancel" => self.cancel_focus(user_id).await,
            "habits" => vec![self.todays_habits().await],
            "deadlines" => {
                let views = self.items.upcoming_deadlines(DEADLINE_LIMIT).await;
                vec![Reply::text(render::deadlines(&views))]
            }
            "today" => {
                let views = self.items.completed_today().await;
                vec![Reply::text(render::completed_today(&views))]
            }
            other => vec![Reply::text(format!("🤷 I don't know /{other}. Try /help."))],
        }
    }

    async fn active_list(&self, user_id: &str) -> Reply {
        let items = self.items.list_active().await;
        if items.is_empty() {
            return Reply::text(
                "No active items yet! Start dumping your thoughts and I'll organize them.",
            );
        }
        let lines = render::grouped_lines(&items);
        self.open_list(user_id, "📋 *Your Active Items:*", ListKind::Active, lines)
    }

    async fn todays_habits(&self) -> Reply {
        let Some(habits) = &self.habits else {
            return Reply::text("🔁 Habit tracking isn't set up yet.");
        };
        let list = habits.list_habits(true, None, None).await;
        let day = today(self.clock.as_ref(), self.offset);
        Reply::text(render::habits(&list, day, self.offset))
    }
}
