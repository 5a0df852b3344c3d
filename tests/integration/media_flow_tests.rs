//! Voice, photo and document handling through the router.

use life_organizer::classifier::ModelTask;
use life_organizer::models::event::EventKind;
use life_organizer::store::properties::{read_file_url, read_rich_text, read_select};

use super::test_helpers::{file, joined, owner_event, Harness, ITEMS_DB, OWNER, TRIAGE_DB};

#[tokio::test]
async fn voice_note_is_transcribed_and_filed_with_bonus() {
    let h = Harness::new().await;
    h.front_end.host_file("F_VOICE", b"ogg-bytes");
    h.speech.set("  remember to renew passport  ");
    h.model.reply(
        ModelTask::Categorize,
        r#"{"category": "Personal", "type": "Task", "priority": "High", "title": "Renew passport"}"#,
    );

    h.dispatch(owner_event(EventKind::Voice {
        file: file("F_VOICE", "voice.ogg", "audio/ogg"),
    }))
    .await;
    let replies = h.front_end.take();

    assert_eq!(replies.len(), 2, "{}", joined(&replies));
    assert!(replies[0].text.contains("I heard"));
    assert!(replies[0].text.contains("remember to renew passport"));
    assert!(replies[1].text.contains("Added to *Personal*"));
    let pages = h.backend.pages_in(ITEMS_DB);
    let notes = read_rich_text(&pages[0].properties, "Notes").expect("notes");
    assert!(notes.starts_with("🎤 Voice note transcription:"));
    assert!(notes.contains("remember to renew passport"));
    assert_eq!(h.state.ledger.get(OWNER).total_xp, 5 + 3);
}

#[tokio::test]
async fn transcript_can_carry_a_management_intent() {
    let h = Harness::new().await;
    let id = h.seed_item("Renew passport", "Personal", "High");
    h.front_end.host_file("F_VOICE", b"ogg-bytes");
    h.speech.set("I renewed my passport");
    h.model.reply(
        ModelTask::ManagementIntent,
        r#"{"intent": "complete", "target": "renew passport"}"#,
    );

    h.dispatch(owner_event(EventKind::Voice {
        file: file("F_VOICE", "voice.ogg", "audio/ogg"),
    }))
    .await;

    assert_eq!(h.status_of(&id).as_deref(), Some("Done"));
    assert_eq!(h.backend.pages_in(ITEMS_DB).len(), 1);
}

#[tokio::test]
async fn failed_transcription_goes_to_triage_with_file_link() {
    let h = Harness::new().await;
    h.front_end.host_file("F_VOICE", b"ogg-bytes");

    h.dispatch(owner_event(EventKind::Voice {
        file: file("F_VOICE", "voice.ogg", "audio/ogg"),
    }))
    .await;
    let replies = h.front_end.take();

    assert!(replies[0].text.contains("transcription failed"));
    assert!(replies[0].text.contains("Brain Dump"));
    assert!(h.backend.pages_in(ITEMS_DB).is_empty());
    let triage = h.backend.pages_in(TRIAGE_DB);
    assert_eq!(triage.len(), 1);
    assert_eq!(
        read_select(&triage[0].properties, "Type").as_deref(),
        Some("Voice")
    );
    assert_eq!(
        read_file_url(&triage[0].properties, "Files").as_deref(),
        Some("https://files.example.test/F_VOICE")
    );
    assert_eq!(h.state.ledger.get(OWNER).total_xp, 0);
}

#[tokio::test]
async fn undownloadable_file_is_still_preserved() {
    let h = Harness::new().await;

    h.dispatch(owner_event(EventKind::Photo {
        file: file("F_MISSING", "receipt.jpg", "image/jpeg"),
        caption: None,
    }))
    .await;
    let replies = h.front_end.take();

    assert!(replies[0].text.contains("couldn't download"));
    let triage = h.backend.pages_in(TRIAGE_DB);
    assert_eq!(triage.len(), 1);
    assert_eq!(
        read_select(&triage[0].properties, "Type").as_deref(),
        Some("Image")
    );
}

#[tokio::test]
async fn photo_is_analyzed_and_filed_as_resource() {
    let h = Harness::new().await;
    h.front_end.host_file("F_IMG", b"jpeg-bytes");
    h.model.reply(
        ModelTask::DescribeImage,
        r#"{"description": "A whiteboard sketch of a database schema", "category": "Personal Projects",
            "suggested_title": "Schema sketch", "priority": "Medium",
            "suggested_action": "Turn it into a migration"}"#,
    );

    h.dispatch(owner_event(EventKind::Photo {
        file: file("F_IMG", "board.jpg", "image/jpeg"),
        caption: Some("from today's meeting".into()),
    }))
    .await;
    let replies = h.front_end.take();

    assert!(
        replies[0].text.contains("added to *Personal Projects*"),
        "{}",
        joined(&replies)
    );
    assert!(replies[0].text.contains("Turn it into a migration"));
    let pages = h.backend.pages_in(ITEMS_DB);
    let props = &pages[0].properties;
    assert_eq!(read_select(props, "Type").as_deref(), Some("Resource"));
    assert_eq!(
        read_file_url(props, "Image").as_deref(),
        Some("https://files.example.test/F_IMG")
    );
    let notes = read_rich_text(props, "Notes").expect("notes");
    assert!(notes.contains("whiteboard sketch"));
    assert!(notes.contains("Caption: from today's meeting"));
}

#[tokio::test]
async fn photo_falls_back_to_caption_when_vision_fails() {
    let h = Harness::new().await;
    h.front_end.host_file("F_IMG", b"jpeg-bytes");
    h.model.fail(ModelTask::DescribeImage);
    h.model.reply(
        ModelTask::Categorize,
        r#"{"category": "Shopping", "type": "Task", "priority": "Low", "title": "Lamp to buy"}"#,
    );

    h.dispatch(owner_event(EventKind::Photo {
        file: file("F_IMG", "lamp.jpg", "image/jpeg"),
        caption: Some("want this lamp".into()),
    }))
    .await;
    let replies = h.front_end.take();

    assert!(
        replies[0].text.contains("added to *Shopping*"),
        "{}",
        joined(&replies)
    );
    assert_eq!(h.model.calls(ModelTask::Categorize), 1);
}

#[tokio::test]
async fn photo_without_caption_uses_placeholder_when_vision_fails() {
    let h = Harness::new().await;
    h.front_end.host_file("F_IMG", b"jpeg-bytes");

    h.dispatch(owner_event(EventKind::Photo {
        file: file("F_IMG", "img.png", "image/png"),
        caption: None,
    }))
    .await;
    let replies = h.front_end.take();

    assert!(replies[0].text.contains("added to *Ideas*"));
    assert_eq!(h.model.calls(ModelTask::Categorize), 0);
    assert_eq!(h.backend.pages_in(ITEMS_DB).len(), 1);
}

#[tokio::test]
async fn document_goes_to_triage_with_suggested_category() {
    let h = Harness::new().await;
    h.model.reply(
        ModelTask::Categorize,
        r#"{"category": "Finance", "type": "Resource", "priority": "Medium", "title": "Tax return 2025"}"#,
    );

    h.dispatch(owner_event(EventKind::Document {
        file: file("F_DOC", "taxes.pdf", "application/pdf"),
        caption: None,
    }))
    .await;
    let replies = h.front_end.take();

    assert!(replies[0].text.contains("Suggested category: *Finance*"));
    assert!(h.backend.pages_in(ITEMS_DB).is_empty());
    let triage = h.backend.pages_in(TRIAGE_DB);
    assert_eq!(triage.len(), 1);
    assert_eq!(
        read_select(&triage[0].properties, "Type").as_deref(),
        Some("Document")
    );
}

#[tokio::test]
async fn document_cancels_a_waiting_delete() {
    let h = Harness::new().await;
    let old = h.seed_item("Old idea", "Ideas", "Low");
    h.model.reply(
        ModelTask::ManagementIntent,
        r#"{"intent": "delete", "target": "old idea"}"#,
    );
    h.say("delete old idea").await;

    h.dispatch(owner_event(EventKind::Document {
        file: file("F_DOC", "notes.pdf", "application/pdf"),
        caption: None,
    }))
    .await;
    let replies = h.front_end.take();

    assert_eq!(replies[0].text, "❌ Delete cancelled.");
    assert!(replies[1].text.contains("Document saved to Brain Dump"));
    assert!(!h.state.sessions.has_pending_delete(OWNER));

    let next = h.say("buy milk").await;

    assert!(next[0].text.contains("Added to"), "{}", joined(&next));
    assert_eq!(h.backend.pages_in(ITEMS_DB).len(), 2);
    assert!(!h.backend.page(&old).expect("page").archived);
}
