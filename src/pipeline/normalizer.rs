//! Story normalization from raw source items to storable records
//!
//! Policy:
//! - Only `type == "story"` items are considered; anything else is skipped
//!   silently (comments, jobs, polls show up in the "new" feed too)
//! - Missing id, title or author rejects the item
//! - Missing url falls back to [`URL_PLACEHOLDER`], missing score to 0

use super::types::{NewStory, RawStory, URL_PLACEHOLDER};
use std::fmt;

const STORY_KIND: &str = "story";

/// Outcome of normalizing one raw item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Accepted(NewStory),
    /// Not a story; not an error
    Skipped,
    Rejected(Rejection),
}

/// Required fields that were missing or empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub missing: Vec<&'static str>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required field: {}", self.missing.join(", "))
    }
}

/// Validate a raw item and apply defaults
pub fn normalize(raw: RawStory) -> Normalized {
    if raw.kind.as_deref() != Some(STORY_KIND) {
        return Normalized::Skipped;
    }

    let id = raw.id.filter(|id| *id > 0);
    let title = non_empty(raw.title);
    let author = non_empty(raw.by);

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push("id");
    }
    if title.is_none() {
        missing.push("title");
    }
    if author.is_none() {
        missing.push("author");
    }

    match (id, title, author) {
        (Some(story_id), Some(title), Some(author)) => Normalized::Accepted(NewStory {
            story_id,
            title,
            url: non_empty(raw.url).unwrap_or_else(|| URL_PLACEHOLDER.to_string()),
            author,
            score: raw.score.unwrap_or(0).max(0),
        }),
        _ => Normalized::Rejected(Rejection { missing }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
