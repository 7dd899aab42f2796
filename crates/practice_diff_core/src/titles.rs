//! crates/practice_diff_core/src/titles.rs
//!
//! Story title resolution shared by both read paths, so the two panes can
//! never disagree because of where their titles came from.

use tracing::warn;

use crate::domain::EntityId;
use crate::ports::TitleLookup;

/// Resolves one story reference to a title.
///
/// A missing reference, a story that no longer exists, and a failed lookup all
/// come back as `None`; the record that carried the reference is kept.
pub async fn resolve_title(lookup: &dyn TitleLookup, story_id: Option<&EntityId>) -> Option<String> {
    let story_id = story_id?;
    match lookup.fetch_story_title(story_id).await {
        Ok(title) => title,
        Err(e) => {
            warn!(story_id = %story_id, error = %e, "Story title lookup failed");
            None
        }
    }
}

/// Resolves a batch of references concurrently, preserving order.
pub async fn resolve_titles(
    lookup: &dyn TitleLookup,
    story_ids: &[Option<EntityId>],
) -> Vec<Option<String>> {
    futures::future::join_all(
        story_ids
            .iter()
            .map(|story_id| resolve_title(lookup, story_id.as_ref())),
    )
    .await
}
