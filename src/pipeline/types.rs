//! Core data structures shared across the ingestion pipeline

use serde::{Deserialize, Serialize};

/// Placeholder stored when a story has no outbound link (Ask HN, Show HN text posts)
pub const URL_PLACEHOLDER: &str = "No URL provided";

/// Message carried by the update event after each ingestion cycle
pub const UPDATE_MESSAGE: &str = "New stories available!";

/// Item payload as returned by the source API
///
/// Every field is optional: the source returns partial items for deleted or
/// dead posts and we decide what to keep in the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStory {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub by: Option<String>,
    pub score: Option<i64>,
}

/// Validated story ready to be written to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
    pub story_id: i64,
    pub title: String,
    pub url: String,
    pub author: String,
    pub score: i64,
}

/// Story as persisted in storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Storage row id
    pub id: i64,
    /// External (source) identifier, unique
    pub story_id: i64,
    pub title: String,
    pub url: String,
    pub author: String,
    pub score: i64,
    /// Unix milliseconds, set on first insert
    pub ingested_at: i64,
}

/// Page of the story listing; also the page cache key
///
/// Both fields are 1-based positive integers; `limit` may not exceed
/// [`PageRequest::MAX_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 100;

    /// Returns `None` when page or limit is zero, or limit is above the max
    pub fn new(page: u32, limit: u32) -> Option<Self> {
        if page == 0 || limit == 0 || limit > Self::MAX_LIMIT {
            return None;
        }
        Some(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Result of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Events pushed to live connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveEvent {
    /// Snapshot sent once right after a connection registers
    Initial { count: u64 },
    /// Sent after every completed ingestion cycle
    Update { message: String },
}

impl LiveEvent {
    pub fn update() -> Self {
        LiveEvent::Update {
            message: UPDATE_MESSAGE.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        // Both variants only hold strings and integers
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_event_wire_format() {
        let initial = LiveEvent::Initial { count: 7 };
        assert_eq!(initial.to_json(), r#"{"type":"initial","count":7}"#);

        let update = LiveEvent::update();
        assert_eq!(
            update.to_json(),
            r#"{"type":"update","message":"New stories available!"}"#
        );
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 10).is_none());
        assert!(PageRequest::new(1, 0).is_none());

        let page = PageRequest::new(3, 10).unwrap();
        assert_eq!(page.offset(), 20);

        let widest = PageRequest::new(2, PageRequest::MAX_LIMIT).unwrap();
        assert_eq!(widest.offset(), 100);
        assert!(PageRequest::new(1, PageRequest::MAX_LIMIT + 1).is_none());
        assert!(PageRequest::new(2, 150).is_none());
    }

    #[test]
    fn test_raw_story_ignores_unknown_fields() {
        let body = r#"{"by":"pg","descendants":3,"id":8863,"kids":[8952],"score":111,"time":1175714200,"title":"My YC app","type":"story","url":"http://www.getdropbox.com/u/2/screencast.html"}"#;

        let raw: RawStory = serde_json::from_str(body).unwrap();
        assert_eq!(raw.id, Some(8863));
        assert_eq!(raw.kind.as_deref(), Some("story"));
        assert_eq!(raw.by.as_deref(), Some("pg"));
        assert_eq!(raw.score, Some(111));
    }
}
