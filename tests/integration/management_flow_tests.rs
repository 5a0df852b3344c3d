//! Management intents: delete with confirmation, complete, reprioritize
//! and query, including target matching.

use life_organizer::classifier::ModelTask;
use life_organizer::resolver::MORE_ACTION;
use life_organizer::store::properties::read_select;

use super::test_helpers::{joined, test_config, Harness, OWNER, PROGRESS_DB};

fn intent(name: &str, target: &str) -> String {
    format!(r#"{{"intent": "{name}", "target": "{target}"}}"#)
}

#[tokio::test]
async fn delete_asks_first_then_archives_on_yes() {
    let h = Harness::new().await;
    let id = h.seed_item("Old idea", "Ideas", "Low");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("delete", "old idea"));

    let prompt = h.say("delete old idea").await;
    assert!(prompt[0].text.contains("Delete *Old idea*?"));
    assert!(h.state.sessions.has_pending_delete(OWNER));
    assert_eq!(h.backend.counts().archives, 0);

    let confirmed = h.say("YES").await;

    assert_eq!(confirmed[0].text, "✅ Deleted successfully!");
    assert_eq!(h.backend.counts().archives, 1);
    assert!(h.backend.page(&id).expect("page").archived);
    assert!(!h.state.sessions.has_pending_delete(OWNER));
}

#[tokio::test]
async fn confirmation_accepts_short_and_arabic_forms() {
    let h = Harness::new().await;
    for answer in ["y", " confirm ", "نعم"] {
        let id = h.seed_item("Scratch", "Ideas", "Low");
        h.model
            .reply(ModelTask::ManagementIntent, &intent("delete", "scratch"));
        h.say("delete scratch").await;

        let replies = h.say(answer).await;

        assert_eq!(
            replies[0].text, "✅ Deleted successfully!",
            "answer {answer:?}"
        );
        assert!(h.backend.page(&id).expect("page").archived);
    }
}

#[tokio::test]
async fn anything_else_cancels_the_delete_without_classifying() {
    let h = Harness::new().await;
    let id = h.seed_item("Old idea", "Ideas", "Low");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("delete", "old idea"));
    h.say("delete old idea").await;
    let intent_calls = h.model.calls(ModelTask::ManagementIntent);

    let replies = h.say("actually no").await;

    assert_eq!(replies[0].text, "❌ Delete cancelled.");
    assert!(!h.backend.page(&id).expect("page").archived);
    assert_eq!(h.model.calls(ModelTask::ManagementIntent), intent_calls);
    assert_eq!(h.model.calls(ModelTask::Categorize), 0);
}

#[tokio::test]
async fn complete_matches_semantically_and_rewards() {
    let h = Harness::new().await;
    let id = h.seed_item("Gym session", "Health", "High");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("complete", "gym"));
    h.model.reply(
        ModelTask::MatchTask,
        r#"{"index": 1, "confidence": "high"}"#,
    );

    let replies = h.say("mark gym as done").await;

    assert!(replies[0].text.contains("Marked *Gym session* as Done"));
    assert_eq!(h.status_of(&id).as_deref(), Some("Done"));
    assert_eq!(h.state.ledger.get(OWNER).total_xp, 15);
    let logged = h.backend.pages_in(PROGRESS_DB);
    assert_eq!(logged.len(), 1);
    assert_eq!(
        read_select(&logged[0].properties, "Category").as_deref(),
        Some("Health")
    );
}

#[tokio::test]
async fn exact_title_skips_the_semantic_matcher() {
    let h = Harness::new().await;
    let id = h.seed_item("Call the bank", "Finance", "Medium");
    h.seed_item("Call mom", "Social", "Medium");
    h.model.reply(
        ModelTask::ManagementIntent,
        &intent("complete", "CALL THE BANK"),
    );

    h.say("call the bank is done").await;

    assert_eq!(h.model.calls(ModelTask::MatchTask), 0);
    assert_eq!(h.status_of(&id).as_deref(), Some("Done"));
}

#[tokio::test]
async fn zero_active_items_never_calls_the_matcher() {
    let h = Harness::new().await;
    h.seed_item_with_status("Finished thing", "Work", "High", "Done");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("delete", "thing"));

    let replies = h.say("delete that thing").await;

    assert_eq!(replies[0].text, "📋 No active items to manage.");
    assert_eq!(h.model.calls(ModelTask::MatchTask), 0);
    assert!(!h.state.sessions.has_pending_delete(OWNER));
}

#[tokio::test]
async fn low_confidence_match_is_rejected() {
    let h = Harness::new().await;
    let id = h.seed_item("Gym session", "Health", "High");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("complete", "swim"));
    h.model
        .reply(ModelTask::MatchTask, r#"{"index": 1, "confidence": "low"}"#);

    let replies = h.say("finished swimming").await;

    assert!(replies[0]
        .text
        .contains("Couldn't find a matching task for 'swim'"));
    assert_eq!(h.status_of(&id).as_deref(), Some("Active"));
    assert_eq!(h.state.ledger.get(OWNER).total_xp, 0);
}

#[tokio::test]
async fn low_confidence_accepted_when_configured() {
    let h = Harness::with_config(test_config("[matching]\nmin_confidence = \"low\"")).await;
    let id = h.seed_item("Gym session", "Health", "High");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("complete", "swim"));
    h.model
        .reply(ModelTask::MatchTask, r#"{"index": 1, "confidence": "low"}"#);

    h.say("finished swimming").await;

    assert_eq!(h.status_of(&id).as_deref(), Some("Done"));
}

#[tokio::test]
async fn matcher_declining_reports_not_found() {
    let h = Harness::new().await;
    h.seed_item("Gym session", "Health", "High");
    h.model
        .reply(ModelTask::ManagementIntent, &intent("delete", "taxes"));
    h.model.reply(
        ModelTask::MatchTask,
        r#"{"index": 0, "confidence": "high"}"#,
    );

    let replies = h.say("delete taxes").await;

    assert!(replies[0].text.contains("Couldn't find"));
    assert!(!h.state.sessions.has_pending_delete(OWNER));
}

#[tokio::test]
async fn reprioritize_writes_new_priority() {
    let h = Harness::new().await;
    let id = h.seed_item("Write report", "Work", "Low");
    h.model.reply(
        ModelTask::ManagementIntent,
        r#"{"intent": "update_priority", "target": "write report", "new_priority": "High"}"#,
    );

    let replies = h.say("make write report high priority").await;

    assert!(replies[0].text.contains("Priority: High"));
    let page = h.backend.page(&id).expect("page");
    assert_eq!(
        read_select(&page.properties, "Priority").as_deref(),
        Some("High")
    );
}

#[tokio::test]
async fn reprioritize_without_level_asks_back() {
    let h = Harness::new().await;
    h.seed_item("Write report", "Work", "Low");
    h.model.reply(
        ModelTask::ManagementIntent,
        r#"{"intent": "update_priority", "target": "write report"}"#,
    );

    let replies = h.say("change the priority of write report").await;

    assert!(replies[0].text.contains("Which priority"));
    assert_eq!(h.backend.counts().updates, 0);
}

#[tokio::test]
async fn query_by_category_lists_only_that_category() {
    let h = Harness::new().await;
    h.seed_item("Gym session", "Health", "High");
    h.seed_item("Dentist", "health", "Medium");
    h.seed_item("Write report", "Work", "High");
    h.model.reply(
        ModelTask::ManagementIntent,
        r#"{"intent": "query", "category": "HEALTH"}"#,
    );

    let replies = h.say("what health stuff do I have").await;

    let text = &replies[0].text;
    assert!(text.starts_with("📋 *Health* (2 items):"), "{text}");
    assert!(text.contains("Gym session"));
    assert!(text.contains("Dentist"));
    assert!(!text.contains("Write report"));
}

#[tokio::test]
async fn empty_query_says_so() {
    let h = Harness::new().await;
    h.model.reply(
        ModelTask::ManagementIntent,
        r#"{"intent": "query", "category": "Finance"}"#,
    );

    let replies = h.say("show finance").await;

    assert_eq!(replies[0].text, "No active items in Finance.");
}

#[tokio::test]
async fn long_query_paginates_behind_more_button() {
    let h = Harness::new().await;
    for n in 0..5 {
        h.seed_item(&format!("Task {n}"), "Work", "Medium");
    }
    h.model
        .reply(ModelTask::ManagementIntent, r#"{"intent": "query"}"#);

    let first = h.say("what's on my plate").await;
    assert_eq!(first[0].buttons.len(), 1);
    assert_eq!(first[0].buttons[0].action_id, MORE_ACTION);
    assert_eq!(first[0].text.lines().count(), 4);

    let second = h.press(MORE_ACTION, &first[0].buttons[0].value).await;
    assert!(second[0].buttons.is_empty(), "{}", joined(&second));
    assert_eq!(second[0].text.lines().count(), 3);

    let expired = h.press(MORE_ACTION, &first[0].buttons[0].value).await;
    assert_eq!(expired[0].text, "That list has expired. Run /active again.");
}
