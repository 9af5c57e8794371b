//! Hacker News API integration
//!
//! Provides the candidate list and per-item detail for ingestion cycles.
//!
//! ## API Reference
//!
//! - `GET {base}/newstories.json` - array of the newest item ids, newest first
//! - `GET {base}/item/{id}.json` - item object, or `null` for unknown ids
//!
//! Default base: `https://hacker-news.firebaseio.com/v0`

use super::error::FetchError;
use super::types::RawStory;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Source of candidate stories
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Newest candidate ids, in source order, at most the configured batch size
    async fn list_candidate_ids(&self) -> Result<Vec<i64>, FetchError>;

    /// Full item for one id
    async fn fetch_detail(&self, id: i64) -> Result<RawStory, FetchError>;
}

/// reqwest-backed client for the Hacker News Firebase API
pub struct HackerNewsClient {
    client: reqwest::Client,
    base_url: String,
    batch_size: usize,
}

impl HackerNewsClient {
    /// Build a client
    ///
    /// # Arguments
    /// * `base_url` - API root without trailing slash
    /// * `batch_size` - maximum candidate ids returned per cycle
    /// * `timeout` - HTTP timeout applied to every request
    pub fn new(base_url: &str, batch_size: usize, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storyflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            batch_size,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl StorySource for HackerNewsClient {
    async fn list_candidate_ids(&self) -> Result<Vec<i64>, FetchError> {
        let url = format!("{}/newstories.json", self.base_url);
        let mut ids: Vec<i64> = self.get_json(&url).await?;
        ids.truncate(self.batch_size);
        Ok(ids)
    }

    async fn fetch_detail(&self, id: i64) -> Result<RawStory, FetchError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let item: Option<RawStory> = self.get_json(&url).await?;
        item.ok_or(FetchError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HackerNewsClient::new(
            "https://hacker-news.firebaseio.com/v0/",
            10,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://hacker-news.firebaseio.com/v0");
        assert_eq!(client.batch_size, 10);
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API
    async fn test_fetch_live_new_stories() {
        let client = HackerNewsClient::new(
            "https://hacker-news.firebaseio.com/v0",
            3,
            Duration::from_secs(10),
        )
        .unwrap();

        let ids = client.list_candidate_ids().await.unwrap();
        assert!(ids.len() <= 3);

        if let Some(id) = ids.first() {
            let item = client.fetch_detail(*id).await.unwrap();
            assert_eq!(item.id, Some(*id));
        }
    }
}
