//! Application context: the single owner of shared pipeline state
//!
//! Built once at startup and handed to the scheduler and the HTTP layer.

use super::auth::TokenAuthority;
use super::cache::PageCache;
use super::db::StoryStore;
use super::error::StorageError;
use super::notifier::Notifier;
use super::types::{PageRequest, Story};
use std::sync::Arc;
use std::time::Duration;

/// Where a page was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrigin {
    Cache,
    Storage,
}

pub struct AppContext {
    pub store: Arc<dyn StoryStore>,
    pub cache: PageCache,
    pub notifier: Arc<Notifier>,
    pub auth: TokenAuthority,
}

impl AppContext {
    pub fn new(store: Arc<dyn StoryStore>, cache_ttl: Duration, auth: TokenAuthority) -> Self {
        let notifier = Arc::new(Notifier::new(store.clone()));
        Self {
            store,
            cache: PageCache::new(cache_ttl),
            notifier,
            auth,
        }
    }

    /// Read-through page lookup: cache first, storage on miss
    ///
    /// Storage errors are not cached.
    pub async fn stories_page(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<Story>, PageOrigin), StorageError> {
        if let Some(stories) = self.cache.get(&page) {
            log::info!("Serving stories from cache (page {}, limit {})", page.page, page.limit);
            return Ok((stories, PageOrigin::Cache));
        }

        let stories = self.store.read_page(page).await?;
        self.cache.set(page, stories.clone());
        log::info!("Serving stories from database (page {}, limit {})", page.page, page.limit);
        Ok((stories, PageOrigin::Storage))
    }
}
