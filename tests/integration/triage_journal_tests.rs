//! Triage capture with the local journal behind the remote database.

use std::sync::Arc;
use std::time::Duration;

use life_organizer::clock::FixedClock;
use life_organizer::models::triage::{TriageEntry, TriageKind, TriageOutcome};
use life_organizer::persistence::db;
use life_organizer::persistence::journal_repo::JournalRepo;
use life_organizer::store::memory::MemoryBackend;
use life_organizer::store::properties::{read_checkbox, read_rich_text, read_select, read_title};
use life_organizer::store::triage::TriageStore;

use super::test_helpers::{start_instant, OWNER};

async fn journal() -> JournalRepo {
    let pool = db::connect_memory().await.expect("in-memory db");
    JournalRepo::new(Arc::new(pool))
}

fn store(backend: &Arc<MemoryBackend>, journal: Option<JournalRepo>) -> TriageStore {
    TriageStore::new(
        backend.clone(),
        "triage",
        Duration::from_secs(5),
        Arc::new(FixedClock::new(start_instant())),
        journal,
    )
}

#[tokio::test]
async fn remote_capture_writes_an_unprocessed_page() {
    let backend = Arc::new(MemoryBackend::new());
    let triage = store(&backend, Some(journal().await));
    let entry = TriageEntry::new("random thought about gardens", TriageKind::Text)
        .with_failure("classification failed");

    let outcome = triage.capture(OWNER, &entry).await;

    let TriageOutcome::Remote(id) = outcome else {
        panic!("expected remote capture, got {outcome:?}");
    };
    let page = backend.page(&id).expect("page");
    assert_eq!(
        read_title(&page.properties, "Name").as_deref(),
        Some("random thought about gardens")
    );
    assert_eq!(read_checkbox(&page.properties, "Processed"), Some(false));
    assert_eq!(
        read_select(&page.properties, "Type").as_deref(),
        Some("Text")
    );
    let content = read_rich_text(&page.properties, "Content").expect("content");
    assert!(content.starts_with("⚠️ classification failed"));
    assert!(content.ends_with("random thought about gardens"));
}

#[tokio::test]
async fn rejected_capture_is_journaled_locally() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_writes(true);
    let repo = journal().await;
    let triage = store(&backend, Some(repo.clone()));
    let entry = TriageEntry::new("voice note", TriageKind::Voice)
        .titled("Voice note")
        .with_file(Some("https://files.example.test/F1".into()));

    let outcome = triage.capture(OWNER, &entry).await;

    assert_eq!(outcome, TriageOutcome::Journaled);
    assert!(outcome.preserved());
    let records = repo.list_for_user(OWNER).await.expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entry, entry);
    assert_eq!(records[0].created_at, start_instant());
    assert!(repo
        .list_for_user("U_OTHER")
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn no_journal_means_content_is_lost() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_writes(true);
    let triage = store(&backend, None);

    let outcome = triage
        .capture(OWNER, &TriageEntry::new("gone", TriageKind::Document))
        .await;

    assert_eq!(outcome, TriageOutcome::Lost);
    assert!(!outcome.preserved());
}

#[test]
fn long_content_gets_a_capped_title() {
    let content = "word ".repeat(60);

    let entry = TriageEntry::new(&content, TriageKind::Text);

    assert_eq!(entry.title.chars().count(), 100);
    assert_eq!(entry.content, content);
}
