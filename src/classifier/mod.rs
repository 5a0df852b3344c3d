//! Classification adapter.
//!
//! Wraps a language model behind [`LanguageModel`] and turns its loosely
//! shaped JSON into the typed outputs in [`crate::models::intent`]. Every
//! operation is stateless and never fails outward: provider errors,
//! timeouts and malformed payloads all map to deterministic fallbacks.

pub mod openai;
pub mod parse;
pub mod prompts;
pub mod transcriber;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::FixedOffset;
use tracing::{debug, warn};

use crate::models::intent::{
    CandidateMatch, Categorization, HabitIntent, ImageAnalysis, ManagementIntent,
};
use crate::models::item::Item;
use crate::util::bounded;
use crate::{AppError, Result};

/// Which question a request asks. Lets fakes script answers per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTask {
    /// Full categorization of new content.
    Categorize,
    /// Delete/complete/reprioritize/query detection.
    ManagementIntent,
    /// Habit create/complete detection.
    HabitIntent,
    /// Pick one item out of a numbered list.
    MatchTask,
    /// Vision analysis of a photo.
    DescribeImage,
}

/// Image attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Encoded image.
    pub bytes: Bytes,
    /// MIME type, e.g. `image/jpeg`.
    pub mime: String,
}

/// One model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// What is being asked.
    pub task: ModelTask,
    /// Full prompt text.
    pub prompt: String,
    /// Image for vision requests.
    pub image: Option<ImageInput>,
}

/// A text (and optionally vision) completion provider.
pub trait LanguageModel: Send + Sync {
    /// Return the raw completion text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Classifier` or `AppError::Timeout` on provider
    /// failure.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Model used when no API key is configured; every call fails so every
/// caller takes its fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredModel;

impl LanguageModel for UnconfiguredModel {
    fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async { Err(AppError::Classifier("no language model configured".into())) })
    }
}

/// What accompanies the text being classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachmentFlags {
    /// The message includes an image.
    pub has_image: bool,
    /// The message includes a document.
    pub has_file: bool,
}

impl AttachmentFlags {
    /// Plain text.
    pub const NONE: Self = Self {
        has_image: false,
        has_file: false,
    };
    /// A document.
    pub const FILE: Self = Self {
        has_image: false,
        has_file: true,
    };
    /// An image.
    pub const IMAGE: Self = Self {
        has_image: true,
        has_file: false,
    };
}

/// Typed front over a [`LanguageModel`].
#[derive(Clone)]
pub struct ClassificationAdapter {
    model: Arc<dyn LanguageModel>,
    text_timeout: Duration,
    vision_timeout: Duration,
    offset: FixedOffset,
}

impl ClassificationAdapter {
    /// Wrap `model`; due dates without an offset are read in `offset`.
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        text_timeout: Duration,
        vision_timeout: Duration,
        offset: FixedOffset,
    ) -> Self {
        Self {
            model,
            text_timeout,
            vision_timeout,
            offset,
        }
    }

    async fn ask(
        &self,
        task: ModelTask,
        prompt: String,
        image: Option<ImageInput>,
    ) -> Result<String> {
        let limit = if image.is_some() {
            self.vision_timeout
        } else {
            self.text_timeout
        };
        bounded(
            limit,
            "classification",
            self.model.complete(CompletionRequest {
                task,
                prompt,
                image,
            }),
        )
        .await
    }

    async fn try_classify(&self, text: &str, flags: AttachmentFlags) -> Result<Categorization> {
        let raw = self
            .ask(
                ModelTask::Categorize,
                prompts::categorize(text, flags),
                None,
            )
            .await?;
        parse::categorization(&raw, text, self.offset)
    }

    /// Categorize new content. Falls back to Ideas/Idea/Low on any failure.
    pub async fn classify(&self, text: &str, flags: AttachmentFlags) -> Categorization {
        match self.try_classify(text, flags).await {
            Ok(categorization) => {
                debug!(
                    category = %categorization.category,
                    priority = categorization.priority.label(),
                    "content classified"
                );
                categorization
            }
            Err(err) => {
                warn!(%err, "classification failed, using fallback");
                Categorization::fallback(text)
            }
        }
    }

    /// Detect a management instruction. Falls back to
    /// [`ManagementIntent::None`].
    pub async fn classify_management_intent(&self, text: &str) -> ManagementIntent {
        let result = async {
            let raw = self
                .ask(
                    ModelTask::ManagementIntent,
                    prompts::management_intent(text),
                    None,
                )
                .await?;
            parse::management_intent(&raw, text)
        }
        .await;
        result.unwrap_or_else(|err| {
            warn!(%err, "management intent failed, treating as none");
            ManagementIntent::None
        })
    }

    /// Detect a habit instruction. Falls back to [`HabitIntent::None`].
    pub async fn classify_habit_intent(&self, text: &str) -> HabitIntent {
        let result = async {
            let raw = self
                .ask(ModelTask::HabitIntent, prompts::habit_intent(text), None)
                .await?;
            parse::habit_intent(&raw)
        }
        .await;
        result.unwrap_or_else(|err| {
            warn!(%err, "habit intent failed, treating as none");
            HabitIntent::None
        })
    }

    /// Describe a photo. On vision failure, retries with the caption as
    /// plain text; without a usable caption, returns a static placeholder.
    pub async fn analyze_image(
        &self,
        bytes: Bytes,
        mime: &str,
        caption: Option<&str>,
    ) -> ImageAnalysis {
        let image = ImageInput {
            bytes,
            mime: mime.to_owned(),
        };
        let vision = async {
            let raw = self
                .ask(
                    ModelTask::DescribeImage,
                    prompts::describe_image(caption),
                    Some(image),
                )
                .await?;
            parse::image_analysis(&raw, caption)
        }
        .await;

        let err = match vision {
            Ok(analysis) => return analysis,
            Err(err) => err,
        };
        warn!(%err, "vision analysis failed");

        let Some(caption) = caption.map(str::trim).filter(|c| !c.is_empty()) else {
            return ImageAnalysis::placeholder();
        };
        match self.try_classify(caption, AttachmentFlags::IMAGE).await {
            Ok(categorization) => ImageAnalysis::from_caption(categorization),
            Err(err) => {
                warn!(%err, "caption classification failed, using placeholder");
                ImageAnalysis::placeholder()
            }
        }
    }

    /// Ask the model which of `candidates` the user meant by `target`.
    ///
    /// `None` when the model declines (index 0), answers out of range, or
    /// fails. The candidate list is never empty when the model is called.
    pub async fn rank_candidates(
        &self,
        target: &str,
        candidates: &[Item],
    ) -> Option<CandidateMatch> {
        if candidates.is_empty() {
            return None;
        }
        let result = async {
            let raw = self
                .ask(
                    ModelTask::MatchTask,
                    prompts::match_task(target, candidates),
                    None,
                )
                .await?;
            parse::candidate_match(&raw, candidates.len())
        }
        .await;
        match result {
            Ok(found) => found,
            Err(err) => {
                warn!(%err, "semantic match failed");
                None
            }
        }
    }
}
