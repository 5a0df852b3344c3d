//! Event router: allow-list, throttling, commands and reply delivery.

use life_organizer::app::{EventOutcome, THROTTLED_TEXT};
use life_organizer::classifier::ModelTask;
use life_organizer::models::event::InboundEvent;
use life_organizer::resolver::MORE_ACTION;
use life_organizer::store::memory::CallCounts;

use super::test_helpers::{test_config, Harness, CHANNEL, OWNER};

#[tokio::test]
async fn unauthorized_user_is_ignored_silently() {
    let h = Harness::new().await;

    let outcome = h
        .dispatch(InboundEvent::text("U_STRANGER", "D_STRANGER", "buy milk"))
        .await;

    assert_eq!(outcome, EventOutcome::Ignored);
    assert!(h.front_end.take().is_empty());
    assert_eq!(h.model.calls(ModelTask::Categorize), 0);
    assert_eq!(h.backend.counts(), CallCounts::default());
}

#[tokio::test]
async fn throttled_user_gets_one_notice_per_event() {
    let h = Harness::with_config(test_config(
        "[rate_limit]\nmax_events = 2\nwindow_seconds = 60",
    ))
    .await;

    assert_eq!(
        h.dispatch(InboundEvent::text(OWNER, CHANNEL, "one")).await,
        EventOutcome::Handled(1)
    );
    assert_eq!(
        h.dispatch(InboundEvent::text(OWNER, CHANNEL, "two")).await,
        EventOutcome::Handled(1)
    );
    h.front_end.take();

    let outcome = h
        .dispatch(InboundEvent::text(OWNER, CHANNEL, "three"))
        .await;

    assert_eq!(outcome, EventOutcome::Throttled);
    let replies = h.front_end.take();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, THROTTLED_TEXT);
    assert_eq!(h.backend.counts().creates, 2);
}

#[tokio::test]
async fn replies_go_to_the_originating_channel() {
    let h = Harness::new().await;

    h.dispatch(InboundEvent::text(OWNER, CHANNEL, "note to self"))
        .await;

    assert_eq!(h.front_end.channels(), vec![CHANNEL.to_owned()]);
}

#[tokio::test]
async fn start_and_help_describe_the_commands() {
    let h = Harness::new().await;

    let start = h.command("start", "").await;
    let help = h.command("help", "").await;

    assert!(start[0].text.contains("/active"));
    assert!(help[0].text.contains("/deadlines"));
}

#[tokio::test]
async fn unknown_command_points_to_help() {
    let h = Harness::new().await;

    let replies = h.command("dance", "").await;

    assert_eq!(replies[0].text, "🤷 I don't know /dance. Try /help.");
}

#[tokio::test]
async fn active_groups_by_category_and_paginates() {
    let h = Harness::new().await;
    h.seed_item("Write report", "Work", "High");
    h.seed_item("Gym session", "Health", "Medium");
    h.seed_item("Prepare slides", "Work", "Medium");
    h.seed_item_with_status("Old task", "Work", "High", "Done");

    let first = h.command("active", "").await;

    let text = &first[0].text;
    assert!(text.starts_with("📋 *Your Active Items:*"), "{text}");
    assert!(text.contains("*Work:*"));
    assert!(text.contains("  • Write report [High]"));
    assert!(!text.contains("Old task"));
    assert_eq!(first[0].buttons[0].action_id, MORE_ACTION);
    assert_eq!(first[0].buttons[0].value, "active");

    let rest = h.press(MORE_ACTION, "active").await;
    assert!(rest[0].text.contains("Gym session"), "{}", rest[0].text);
    assert!(rest[0].buttons.is_empty());
}

#[tokio::test]
async fn active_with_argument_filters_by_category() {
    let h = Harness::new().await;
    h.seed_item("Write report", "Work", "High");
    h.seed_item("Gym session", "Health", "Medium");

    let replies = h.command("active", "health").await;

    assert!(replies[0].text.contains("Gym session"));
    assert!(!replies[0].text.contains("Write report"));
}

#[tokio::test]
async fn active_on_empty_workspace_encourages_capture() {
    let h = Harness::new().await;

    let replies = h.command("active", "").await;

    assert!(replies[0].text.starts_with("No active items yet!"));
}

#[tokio::test]
async fn stats_reflect_the_ledger() {
    let h = Harness::new().await;
    h.say("first thought").await;

    let replies = h.command("stats", "").await;

    let text = &replies[0].text;
    assert!(text.contains("*Level 1*: 🌱 Seedling"), "{text}");
    assert!(text.contains("5/50 XP"), "{text}");
    assert!(text.contains("*Streak*: 1 days"), "{text}");
}

#[tokio::test]
async fn weekly_counts_active_items() {
    let h = Harness::new().await;
    h.seed_item("Write report", "Work", "High");
    h.seed_item("Gym session", "Health", "Medium");

    let replies = h.command("weekly", "").await;

    let text = &replies[0].text;
    assert!(text.contains("*Active Tasks:* 2"), "{text}");
    assert!(text.contains("High Priority: 1"), "{text}");
    assert!(text.contains("  • Work: 1"), "{text}");
}

#[tokio::test]
async fn button_presses_skip_the_progress_indicator() {
    let h = Harness::new().await;

    h.press(MORE_ACTION, "query").await;
    h.press("something_else", "x").await;

    assert_eq!(h.front_end.progress_calls(), 0);
}
