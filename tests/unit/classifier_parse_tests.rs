use life_organizer::classifier::parse;
use life_organizer::clock::utc_offset;
use life_organizer::models::habit::{DayPart, Frequency};
use life_organizer::models::intent::{
    Categorization, HabitIntent, ManagementIntent, MatchConfidence,
};
use life_organizer::models::item::{Category, DueDate, ItemType, Priority};

#[test]
fn categorization_reads_every_field() {
    let raw = r#"{"category": "Study", "type": "Task", "priority": "High",
        "title": "Chapter 5", "summary": "Read chapter 5 before the midterm",
        "suggested_action": "Block two hours", "due_date": "2026-03-14"}"#;

    let parsed =
        parse::categorization(raw, "study chapter 5 by saturday", utc_offset()).expect("parses");

    assert_eq!(parsed.category, Category::Study);
    assert_eq!(parsed.item_type, ItemType::Task);
    assert_eq!(parsed.priority, Priority::High);
    assert_eq!(parsed.title, "Chapter 5");
    assert_eq!(parsed.suggested_action.as_deref(), Some("Block two hours"));
    assert!(matches!(parsed.due, Some(DueDate::Day(_))));
}

#[test]
fn categorization_fills_gaps_from_the_text() {
    let raw =
        r#"{"category": "Gardening", "type": "chore", "due_date": "null", "suggested_action": ""}"#;

    let parsed = parse::categorization(raw, "  plant tomatoes  ", utc_offset()).expect("parses");

    assert_eq!(parsed.category, Category::Ideas);
    assert_eq!(parsed.item_type, ItemType::Idea);
    assert_eq!(parsed.priority, Priority::Low);
    assert_eq!(parsed.title, "plant tomatoes");
    assert_eq!(parsed.summary, "  plant tomatoes  ");
    assert_eq!(parsed.suggested_action, None);
    assert_eq!(parsed.due, None);
}

#[test]
fn categorization_survives_chatter_around_fences() {
    let raw = "Here you go:\n```json\n{\"category\": \"Shopping\", \"title\": \"Milk\"}\n```\nAnything else?";

    let parsed = parse::categorization(raw, "buy milk", utc_offset()).expect("parses");

    assert_eq!(parsed.category, Category::Shopping);
    assert_eq!(parsed.title, "Milk");
}

#[test]
fn long_titles_are_capped() {
    let raw = format!(r#"{{"title": "{}"}}"#, "t".repeat(90));

    let parsed = parse::categorization(&raw, "x", utc_offset()).expect("parses");

    assert_eq!(parsed.title.chars().count(), 50);
}

#[test]
fn prose_reply_is_an_error() {
    assert!(parse::categorization("I'm not sure", "x", utc_offset()).is_err());
    assert!(parse::management_intent("no json here", "x").is_err());
}

#[test]
fn fallback_is_a_low_priority_idea() {
    let fallback = Categorization::fallback("random thought");

    assert_eq!(fallback.category, Category::Ideas);
    assert_eq!(fallback.item_type, ItemType::Idea);
    assert_eq!(fallback.priority, Priority::Low);
    assert_eq!(fallback.title, "random thought");
}

#[test]
fn management_intents_map_to_variants() {
    assert_eq!(
        parse::management_intent(r#"{"intent": "delete", "target": "old idea"}"#, "x").expect("ok"),
        ManagementIntent::Delete {
            target: "old idea".into()
        }
    );
    assert_eq!(
        parse::management_intent(r#"{"intent": "QUERY", "category": "Work"}"#, "x").expect("ok"),
        ManagementIntent::Query {
            category: Some("Work".into())
        }
    );
    assert_eq!(
        parse::management_intent(r#"{"intent": "query", "category": null}"#, "x").expect("ok"),
        ManagementIntent::Query { category: None }
    );
    assert_eq!(
        parse::management_intent(r#"{"intent": "none"}"#, "x").expect("ok"),
        ManagementIntent::None
    );
    assert_eq!(
        parse::management_intent(r#"{"intent": "celebrate"}"#, "x").expect("ok"),
        ManagementIntent::None
    );
}

#[test]
fn empty_target_falls_back_to_the_utterance() {
    let parsed = parse::management_intent(r#"{"intent": "complete", "target": ""}"#, " gym done ")
        .expect("ok");

    assert_eq!(
        parsed,
        ManagementIntent::Complete {
            target: "gym done".into()
        }
    );
}

#[test]
fn priority_update_may_lack_a_level() {
    let with = parse::management_intent(
        r#"{"intent": "update_priority", "target": "report", "new_priority": "high"}"#,
        "x",
    )
    .expect("ok");
    let without =
        parse::management_intent(r#"{"intent": "update_priority", "target": "report"}"#, "x")
            .expect("ok");

    assert_eq!(
        with,
        ManagementIntent::UpdatePriority {
            target: "report".into(),
            new_priority: Some(Priority::High)
        }
    );
    assert_eq!(
        without,
        ManagementIntent::UpdatePriority {
            target: "report".into(),
            new_priority: None
        }
    );
}

#[test]
fn habit_creation_defaults() {
    let parsed = parse::habit_intent(
        r#"{"intent": "create_habit", "habit_name": "Read", "frequency": "fortnightly",
            "times": ["Morning", "midnight", "evening"], "xp_reward": -5}"#,
    )
    .expect("ok");

    let HabitIntent::Create(habit) = parsed else {
        panic!("expected create, got {parsed:?}");
    };
    assert_eq!(habit.name, "Read");
    assert_eq!(habit.frequency, Frequency::Daily);
    assert_eq!(habit.category, Category::Ideas);
    assert_eq!(habit.times, vec![DayPart::Morning, DayPart::Evening]);
    assert_eq!(habit.xp_reward, None);
}

#[test]
fn habit_reward_is_rounded() {
    let parsed = parse::habit_intent(
        r#"{"intent": "create_habit", "habit_name": "Walk", "xp_reward": 12.6}"#,
    )
    .expect("ok");

    assert!(matches!(parsed, HabitIntent::Create(h) if h.xp_reward == Some(13)));
}

#[test]
fn habit_intent_without_name_is_none() {
    assert_eq!(
        parse::habit_intent(r#"{"intent": "complete_habit", "habit_name": ""}"#).expect("ok"),
        HabitIntent::None
    );
    assert_eq!(
        parse::habit_intent(r#"{"intent": "complete_habit", "habit_name": "Stretch"}"#)
            .expect("ok"),
        HabitIntent::Complete {
            name: "Stretch".into()
        }
    );
}

#[test]
fn image_description_falls_back_to_caption() {
    let parsed =
        parse::image_analysis(r#"{"category": "Shopping"}"#, Some(" new lamp ")).expect("ok");

    assert_eq!(parsed.description, "new lamp");
    assert_eq!(parsed.category, Category::Shopping);
    assert_eq!(parsed.suggested_title, "Image");
    assert_eq!(parsed.priority, Priority::Low);
}

#[test]
fn match_reply_is_one_based() {
    let found = parse::candidate_match(r#"{"index": 3, "confidence": "HIGH"}"#, 3)
        .expect("ok")
        .expect("match");

    assert_eq!(found.index, 2);
    assert_eq!(found.confidence, MatchConfidence::High);
    assert_eq!(
        parse::candidate_match(r#"{"index": 1, "confidence": "sure"}"#, 3)
            .expect("ok")
            .map(|m| m.confidence),
        Some(MatchConfidence::Low)
    );
    assert_eq!(
        parse::candidate_match(r#"{"index": null}"#, 3).expect("ok"),
        None
    );
}
