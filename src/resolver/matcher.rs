//! Target resolution for management intents.
//!
//! Two stages: a unique case-insensitive title equality wins outright;
//! otherwise the classification adapter ranks the numbered candidate list
//! and its answer is accepted only at or above the configured confidence.

use tracing::{debug, info};

use crate::classifier::ClassificationAdapter;
use crate::models::intent::MatchConfidence;
use crate::models::item::Item;

/// Result of resolving a free-text reference.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// There were no active items to choose from.
    NoItems,
    /// Nothing matched with enough confidence.
    NotFound,
    /// Exactly one item was selected.
    Found(Item),
}

/// Resolve `target` among `items`.
///
/// The semantic matcher is never consulted when `items` is empty.
pub async fn resolve_target(
    classifier: &ClassificationAdapter,
    items: &[Item],
    target: &str,
    min_confidence: MatchConfidence,
) -> MatchOutcome {
    if items.is_empty() {
        return MatchOutcome::NoItems;
    }

    let wanted = target.trim().to_lowercase();
    let mut exact = items
        .iter()
        .filter(|item| item.title.trim().to_lowercase() == wanted);
    if let (Some(item), None) = (exact.next(), exact.next()) {
        debug!(item_id = %item.id, "target matched by exact title");
        return MatchOutcome::Found(item.clone());
    }

    let Some(found) = classifier.rank_candidates(target, items).await else {
        info!(target, "no semantic match");
        return MatchOutcome::NotFound;
    };
    if found.confidence < min_confidence {
        info!(
            target,
            confidence = ?found.confidence,
            "semantic match rejected as too uncertain"
        );
        return MatchOutcome::NotFound;
    }
    match items.get(found.index) {
        Some(item) => {
            debug!(item_id = %item.id, confidence = ?found.confidence, "target matched semantically");
            MatchOutcome::Found(item.clone())
        }
        None => MatchOutcome::NotFound,
    }
}
