//! Voice, photo and document pipelines.

use std::fmt::Write as _;

use bytes::Bytes;
use tracing::{info, warn};

use super::{xp_line, InputSource, IntentResolver};
use crate::classifier::transcriber::Transcription;
use crate::classifier::AttachmentFlags;
use crate::models::event::{FileRef, Reply};
use crate::models::item::{ItemType, NewItem};
use crate::models::triage::{TriageEntry, TriageKind};

impl IntentResolver {
    /// Transcribe a voice note and resolve the transcript. During a focus
    /// session the transcript is parked like typed text.
    pub async fn handle_voice(&self, user_id: &str, file: &FileRef, audio: Bytes) -> Vec<Reply> {
        match self
            .transcriber
            .transcribe(audio, &file.name, &file.mimetype)
            .await
        {
            Transcription::Failed { reason } => {
                let mut replies: Vec<Reply> =
                    self.deny_pending_delete(user_id).into_iter().collect();
                let entry =
                    TriageEntry::new("Voice note (transcription failed)", TriageKind::Voice)
                        .with_file(Some(file.url.clone()))
                        .with_failure(format!("Transcription failed: {reason}"));
                let outcome = self.triage.capture(user_id, &entry).await;
                let text = if outcome.preserved() {
                    "🎤 Voice note received but transcription failed.\n\n\
                     Saved to Brain Dump for manual review."
                } else {
                    "🎤 Voice note received but transcription failed, and I couldn't save it. \
                     Please try again."
                };
                replies.push(Reply::text(text));
                replies
            }
            Transcription::Text(transcript) => {
                let mut replies = vec![Reply::text(format!("🎤 *I heard:*\n_{transcript}_"))];
                if let Some(parked) = self.intercept_focus(user_id, &transcript).await {
                    replies.extend(parked);
                    return replies;
                }
                replies.extend(
                    self.resolve_text(user_id, &transcript, InputSource::Voice)
                        .await,
                );
                replies
            }
        }
    }

    /// Analyze a photo and file it as a resource.
    pub async fn handle_photo(
        &self,
        user_id: &str,
        file: &FileRef,
        image: Bytes,
        caption: Option<&str>,
    ) -> Reply {
        let analysis = self
            .classifier
            .analyze_image(image, &file.mimetype, caption)
            .await;
        let mut notes = format!("📸 Image Analysis:\n\n{}", analysis.description);
        if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
            notes.push_str("\n\nCaption: ");
            notes.push_str(caption);
        }
        let item = NewItem::new(
            &analysis.suggested_title,
            analysis.category.clone(),
            ItemType::Resource,
            analysis.priority,
            &notes,
        )
        .with_attachment(Some(file.url.clone()));

        if self.items.create_item(&item).await.is_none() {
            let entry = TriageEntry::new(&notes, TriageKind::Image)
                .titled(&analysis.suggested_title)
                .with_file(Some(file.url.clone()))
                .with_failure("Image analyzed but item store write failed");
            let outcome = self.triage.capture(user_id, &entry).await;
            return Reply::text(if outcome.preserved() {
                "⚠️ Analyzed but couldn't save. Added to Brain Dump."
            } else {
                "❌ Analyzed but couldn't save that image anywhere. Please send it again."
            });
        }

        let amount = self.rewards.task_added;
        let award = self.ledger.award(user_id, amount, "photo filed");
        info!(user_id, category = %item.category, "photo filed");
        let mut text = format!(
            "📸 Image analyzed & added to *{}*\n\n📌 {}\n📝 {}\n",
            item.category, item.title, analysis.description
        );
        if let Some(action) = analysis.suggested_action.filter(|a| !a.trim().is_empty()) {
            let _ = write!(text, "\n💡 Suggestion: {action}\n");
        }
        text.push('\n');
        text.push_str(&xp_line(&award, amount));
        Reply::text(text)
    }

    /// File a document for manual review with a suggested category.
    pub async fn handle_document(
        &self,
        user_id: &str,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Reply {
        let label = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&file.name);
        let text = format!("Document: {label}");
        let categorization = self.classifier.classify(&text, AttachmentFlags::FILE).await;
        let entry = TriageEntry::new(&text, TriageKind::Document)
            .titled(&categorization.title)
            .with_file(Some(file.url.clone()));
        if self.triage.capture(user_id, &entry).await.preserved() {
            Reply::text(format!(
                "📄 Document saved to Brain Dump\nSuggested category: *{}*",
                categorization.category
            ))
        } else {
            Reply::text("❌ Couldn't save that document. Please send it again.")
        }
    }

    /// Preserve a file whose bytes could not be downloaded.
    pub async fn capture_undownloadable(
        &self,
        user_id: &str,
        file: &FileRef,
        kind: TriageKind,
    ) -> Reply {
        warn!(user_id, file_id = %file.id, kind = kind.label(), "file download failed");
        let entry = TriageEntry::new(&format!("{} ({})", file.name, kind.label()), kind)
            .with_file(Some(file.url.clone()))
            .with_failure("File could not be downloaded");
        if self.triage.capture(user_id, &entry).await.preserved() {
            Reply::text(
                "⚠️ I couldn't download that file. Saved a link to Brain Dump for manual review.",
            )
        } else {
            Reply::text("❌ I couldn't download that file. Please send it again.")
        }
    }
}
