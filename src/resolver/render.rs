//! Message text for lists, stats and static help.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::FixedOffset;

use crate::models::habit::Habit;
use crate::models::item::{CompletionView, DeadlineBand, DeadlineView, Item, Priority};
use crate::models::xp::{Level, XpRecord};

/// Greeting for `/start`.
pub const START_TEXT: &str = "Hey! 👋\n\n\
I'm your Life Organizer. Just dump anything on your mind:\n\n\
📝 Text messages\n\
📸 Images (with or without captions)\n\
📄 PDFs/Documents\n\
🎤 Voice notes\n\n\
I'll categorize everything and file it in your workspace.\n\n\
Commands:\n\
/active - See what you're currently working on\n\
/help - Get help";

/// Text for `/help`.
pub const HELP_TEXT: &str = "🤖 *Life Organizer Help*\n\n\
*How to use:*\n\
Just send me anything! I'll organize it for you.\n\n\
*Examples:*\n\
• \"Buy whey protein\" → Shopping\n\
• \"Study chapter 5 for midterm\" → Study\n\
• \"Mark gym as done\" → completes the task\n\
• \"New habit: drink water every morning\" → habit\n\n\
*Commands:*\n\
/start - Introduction\n\
/active - See active items\n\
/focus - 🎯 Focus on ONE task\n\
/cancel - Leave focus mode\n\
/habits - 🔁 Today's habits\n\
/deadlines - ⏰ Upcoming deadlines\n\
/today - ✅ Finished today\n\
/stats - 📊 Your XP & level\n\
/weekly - 📅 Weekly review\n\
/help - This message";

/// One list line: priority marker, title, category.
#[must_use]
pub fn item_line(item: &Item) -> String {
    format!(
        "{} {} ({})",
        Priority::marker(item.priority),
        item.title,
        item.category
    )
}

/// Active items grouped by category, in first-seen order.
#[must_use]
pub fn grouped_lines(items: &[Item]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        let key = item.category.label().to_owned();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        let priority = item.priority.map_or("—", Priority::label);
        groups
            .entry(key)
            .or_default()
            .push(format!("  • {} [{priority}]", item.title));
    }
    let mut lines = Vec::new();
    for key in order {
        lines.push(format!("*{key}:*"));
        if let Some(entries) = groups.remove(&key) {
            lines.extend(entries);
        }
    }
    lines
}

/// Ten-cell progress bar.
#[must_use]
pub fn progress_bar(fraction: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (fraction.clamp(0.0, 1.0) * 10.0).floor() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn streak_flames(streak: u32) -> &'static str {
    match streak {
        0 => "💤",
        1..=2 => "🔥",
        3..=6 => "🔥🔥",
        _ => "🔥🔥🔥",
    }
}

/// `/stats` body.
#[must_use]
pub fn stats(record: &XpRecord) -> String {
    let level = Level::for_xp(record.total_xp);
    let progress = match level.xp_to_next {
        Some(remaining) => format!(
            "{} {}/{} XP",
            progress_bar(level.progress),
            record.total_xp,
            record.total_xp + remaining
        ),
        None => "🏆 MAX LEVEL!".into(),
    };
    format!(
        "📊 *Your Stats*\n\n\
         *Level {}*: {} {}\n\
         {progress}\n\n\
         *Streak*: {} days {}\n\n\
         _Keep adding and completing tasks to level up!_",
        level.number,
        level.badge,
        level.title,
        record.streak_days,
        streak_flames(record.streak_days),
    )
}

/// `/weekly` body.
#[must_use]
pub fn weekly(items: &[Item], record: &XpRecord) -> String {
    let high = items
        .iter()
        .filter(|item| item.priority == Some(Priority::High))
        .count();
    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        *by_category.entry(item.category.label()).or_default() += 1;
    }
    let mut categories = String::new();
    for (category, count) in &by_category {
        let _ = writeln!(categories, "  • {category}: {count}");
    }
    let level = Level::for_xp(record.total_xp);
    format!(
        "📅 *Weekly Review*\n\n\
         *Active Tasks:* {}\n\
         🔴 High Priority: {high}\n\n\
         *By Category:*\n{categories}\n\
         ──────────────\n\
         *Your Progress:*\n\
         Level {}: {}\n\
         🔥 {} day streak\n\
         ⭐ {} XP total\n\n\
         _Use /focus to tackle your top task!_",
        items.len(),
        level.number,
        level.title,
        record.streak_days,
        record.total_xp,
    )
}

/// Human label for a deadline band.
#[must_use]
pub fn deadline_label(view: &DeadlineView) -> String {
    match view.band {
        DeadlineBand::Overdue { hours } => format!("🔥 OVERDUE ({hours}h)"),
        DeadlineBand::Hours(hours) => format!("💣 {hours}h LEFT"),
        DeadlineBand::Days(days) => format!("{days} DAYS LEFT"),
    }
}

/// `/deadlines` body.
#[must_use]
pub fn deadlines(views: &[DeadlineView]) -> String {
    if views.is_empty() {
        return "⏰ No upcoming deadlines. Breathe easy!".into();
    }
    let mut text = String::from("⏰ *Upcoming Deadlines*\n\n");
    for view in views {
        let _ = writeln!(text, "• {} | {}", deadline_label(view), view.title);
    }
    text
}

/// `/today` body.
#[must_use]
pub fn completed_today(views: &[CompletionView]) -> String {
    if views.is_empty() {
        return "Nothing finished yet today. One small thing counts! 💪".into();
    }
    let mut text = format!("✅ *Done Today* ({})\n\n", views.len());
    for view in views {
        let _ = writeln!(text, "• {} ({})", view.title, view.category);
    }
    text
}

/// `/habits` body.
#[must_use]
pub fn habits(habits: &[Habit], today: chrono::NaiveDate, offset: FixedOffset) -> String {
    if habits.is_empty() {
        return "🔁 No habits yet. Try: \"new habit: stretch every morning\"".into();
    }
    let done = habits
        .iter()
        .filter(|habit| habit.completed_on(today, offset))
        .count();
    let mut text = format!("🔁 *Today's Habits* ({done}/{})\n\n", habits.len());
    for habit in habits {
        let mark = if habit.completed_on(today, offset) {
            "✅"
        } else {
            "⏳"
        };
        let _ = writeln!(
            text,
            "{mark} {} {} ({}) - {} XP",
            habit.category.icon(),
            habit.name,
            habit.frequency.label(),
            habit.xp_reward
        );
    }
    text
}
