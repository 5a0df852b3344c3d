//! Habit creation, completion and the daily habit list.

use chrono::Duration;
use life_organizer::classifier::ModelTask;
use life_organizer::config::GlobalConfig;
use life_organizer::store::properties::{read_number, read_select};

use super::test_helpers::{Harness, HABITS_DB, ITEMS_DB, OWNER, PROGRESS_DB};

const CREATE_STRETCH: &str = r#"{"intent": "create_habit", "habit_name": "Stretch",
    "frequency": "Daily", "category": "Health", "times": ["Morning"], "xp_reward": 10}"#;

const COMPLETE_STRETCH: &str = r#"{"intent": "complete_habit", "habit_name": "stretch"}"#;

#[tokio::test]
async fn habit_is_created_with_its_reward() {
    let h = Harness::new().await;
    h.model.reply(ModelTask::HabitIntent, CREATE_STRETCH);

    let replies = h.say("new habit: stretch every morning").await;

    assert!(replies[0].text.contains("New habit tracked: *Stretch*"));
    assert!(replies[0].text.contains("10 XP per completion"));
    let habits = h.backend.pages_in(HABITS_DB);
    assert_eq!(habits.len(), 1);
    assert_eq!(read_number(&habits[0].properties, "XP Reward"), Some(10.0));
    assert_eq!(
        read_select(&habits[0].properties, "Frequency").as_deref(),
        Some("Daily")
    );
    assert!(h.backend.pages_in(ITEMS_DB).is_empty());
    assert_eq!(h.model.calls(ModelTask::ManagementIntent), 0);
}

#[tokio::test]
async fn completing_a_habit_awards_once_per_day() {
    let h = Harness::new().await;
    h.model.reply(ModelTask::HabitIntent, CREATE_STRETCH);
    h.say("new habit: stretch every morning").await;

    h.model.reply(ModelTask::HabitIntent, COMPLETE_STRETCH);
    let first = h.say("stretched!").await;
    assert!(first[0].text.contains("*Stretch* done"));
    assert_eq!(h.state.ledger.get(OWNER).total_xp, 10);
    assert_eq!(h.backend.pages_in(PROGRESS_DB).len(), 1);

    h.model.reply(ModelTask::HabitIntent, COMPLETE_STRETCH);
    let again = h.say("stretched again").await;
    assert!(again[0].text.contains("already done today"));
    assert_eq!(h.state.ledger.get(OWNER).total_xp, 10);

    h.clock.advance(Duration::days(1));
    h.model.reply(ModelTask::HabitIntent, COMPLETE_STRETCH);
    h.say("stretched").await;
    let record = h.state.ledger.get(OWNER);
    assert_eq!(record.total_xp, 20);
    assert_eq!(record.streak_days, 2);
}

#[tokio::test]
async fn unknown_habit_is_reported() {
    let h = Harness::new().await;
    h.model.reply(
        ModelTask::HabitIntent,
        r#"{"intent": "complete_habit", "habit_name": "meditate"}"#,
    );

    let replies = h.say("meditated").await;

    assert!(replies[0]
        .text
        .contains("Couldn't find a habit matching 'meditate'"));
}

#[tokio::test]
async fn habits_command_lists_todays_state() {
    let h = Harness::new().await;
    h.model.reply(ModelTask::HabitIntent, CREATE_STRETCH);
    h.say("new habit: stretch every morning").await;
    h.model.reply(
        ModelTask::HabitIntent,
        r#"{"intent": "create_habit", "habit_name": "Read", "frequency": "Daily"}"#,
    );
    h.say("new habit: read daily").await;
    h.model.reply(ModelTask::HabitIntent, COMPLETE_STRETCH);
    h.say("stretched").await;

    let replies = h.command("habits", "").await;

    let text = &replies[0].text;
    assert!(text.contains("(1/2)"), "{text}");
    assert!(text.contains("✅ 💪 Stretch (Daily) - 10 XP"), "{text}");
    assert!(text.contains("⏳ 💡 Read (Daily) - 25 XP"), "{text}");
}

#[tokio::test]
async fn habits_are_skipped_without_a_habits_database() {
    let config = GlobalConfig::from_toml_str(
        r#"
authorized_user_ids = ["U_OWNER"]

[workspace]
items_db_id = "items-db"
triage_db_id = "triage-db"
progress_db_id = "progress-db"
"#,
    )
    .expect("config");
    let h = Harness::with_config(config).await;

    h.say("new habit: stretch every morning").await;
    let replies = h.command("habits", "").await;

    assert_eq!(h.model.calls(ModelTask::HabitIntent), 0);
    assert_eq!(h.backend.pages_in(ITEMS_DB).len(), 1);
    assert_eq!(replies[0].text, "🔁 Habit tracking isn't set up yet.");
}
