//! Story storage: trait contract plus the SQLite implementation
//!
//! Table written (see `sql/01_stories.sql`):
//! - `stories` - INSERT OR IGNORE keyed on `story_id` (first write wins)

use super::error::StorageError;
use super::types::{NewStory, PageRequest, Story, UpsertOutcome};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = include_str!("../../sql/01_stories.sql");

/// Trait for the durable story store
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Insert a story unless its `story_id` is already present
    ///
    /// A duplicate is a no-op and reported as `AlreadyPresent`, never an error.
    async fn upsert(&self, story: &NewStory) -> Result<UpsertOutcome, StorageError>;

    /// Read one page, newest ingestion first
    ///
    /// Offset is `(page - 1) * limit`.
    async fn read_page(&self, page: PageRequest) -> Result<Vec<Story>, StorageError>;

    /// Count stories ingested within the trailing `window`
    async fn count_since(&self, window: Duration) -> Result<u64, StorageError>;
}

/// SQLite implementation of StoryStore
///
/// A single connection behind a mutex; the lock is never held across an await.
pub struct SqliteStoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStoryStore {
    /// Open (or create) the database file and apply the schema
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        log::info!("📊 SQLite journal mode: {}", mode);

        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        log::info!("✅ Story schema ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Insert with an explicit ingestion timestamp (Unix milliseconds)
    pub fn insert_at(&self, story: &NewStory, ingested_at: i64) -> Result<UpsertOutcome, StorageError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            r#"
            INSERT OR IGNORE INTO stories (story_id, title, url, author, score, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                story.story_id,
                story.title,
                story.url,
                story.author,
                story.score,
                ingested_at,
            ],
        )?;

        Ok(if changed == 0 {
            UpsertOutcome::AlreadyPresent
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Total number of stored stories
    pub fn count_all(&self) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl StoryStore for SqliteStoryStore {
    async fn upsert(&self, story: &NewStory) -> Result<UpsertOutcome, StorageError> {
        self.insert_at(story, now_millis())
    }

    async fn read_page(&self, page: PageRequest) -> Result<Vec<Story>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, story_id, title, url, author, score, ingested_at
             FROM stories
             ORDER BY ingested_at DESC, id DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![page.limit as i64, page.offset() as i64], |row| {
            Ok(Story {
                id: row.get(0)?,
                story_id: row.get(1)?,
                title: row.get(2)?,
                url: row.get(3)?,
                author: row.get(4)?,
                score: row.get(5)?,
                ingested_at: row.get(6)?,
            })
        })?;

        let mut stories = Vec::with_capacity(page.limit as usize);
        for story in rows {
            stories.push(story?);
        }
        Ok(stories)
    }

    async fn count_since(&self, window: Duration) -> Result<u64, StorageError> {
        let cutoff = now_millis() - window.as_millis() as i64;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM stories WHERE ingested_at >= ?1",
            [cutoff],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn story(id: i64) -> NewStory {
        NewStory {
            story_id: id,
            title: format!("Story {}", id),
            url: format!("https://example.com/{}", id),
            author: "bob".to_string(),
            score: id,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = SqliteStoryStore::open_in_memory().unwrap();

        assert_eq!(store.upsert(&story(1)).await.unwrap(), UpsertOutcome::Inserted);

        // Same id with different content: first write wins
        let mut changed = story(1);
        changed.title = "Edited title".to_string();
        assert_eq!(
            store.upsert(&changed).await.unwrap(),
            UpsertOutcome::AlreadyPresent
        );

        assert_eq!(store.count_all().unwrap(), 1);
        let page = store.read_page(PageRequest::default()).await.unwrap();
        assert_eq!(page[0].title, "Story 1");
    }

    #[tokio::test]
    async fn test_read_page_orders_by_recency() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let base = 1_700_000_000_000;

        for id in 1..=25 {
            store.insert_at(&story(id), base + id * 1000).unwrap();
        }

        let first = store.read_page(PageRequest::new(1, 10).unwrap()).await.unwrap();
        let second = store.read_page(PageRequest::new(2, 10).unwrap()).await.unwrap();
        let third = store.read_page(PageRequest::new(3, 10).unwrap()).await.unwrap();

        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
        assert_eq!(third.len(), 5);

        let first_ids: Vec<i64> = first.iter().map(|s| s.story_id).collect();
        assert_eq!(first_ids, (16..=25).rev().collect::<Vec<_>>());

        // Pages never overlap while storage is unchanged
        assert!(second.iter().all(|s| !first_ids.contains(&s.story_id)));
        assert_eq!(second[0].story_id, 15);

        // Descending recency across the whole listing
        let all: Vec<i64> = first
            .iter()
            .chain(second.iter())
            .chain(third.iter())
            .map(|s| s.ingested_at)
            .collect();
        assert!(all.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_read_page_breaks_timestamp_ties_by_row() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let ts = 1_700_000_000_000;

        for id in [10, 20, 30] {
            store.insert_at(&story(id), ts).unwrap();
        }

        let first = store.read_page(PageRequest::new(1, 2).unwrap()).await.unwrap();
        let second = store.read_page(PageRequest::new(2, 2).unwrap()).await.unwrap();

        let ids: Vec<i64> = first.iter().chain(second.iter()).map(|s| s.story_id).collect();
        assert_eq!(ids, vec![30, 20, 10]);
    }

    #[tokio::test]
    async fn test_count_since_uses_trailing_window() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let window = Duration::from_secs(300);

        assert_eq!(store.count_since(window).await.unwrap(), 0);

        let now = now_millis();
        store.insert_at(&story(1), now - 10 * 60 * 1000).unwrap(); // 10 minutes ago
        store.insert_at(&story(2), now - 6 * 60 * 1000).unwrap(); // 6 minutes ago
        store.insert_at(&story(3), now - 60 * 1000).unwrap(); // 1 minute ago
        store.upsert(&story(4)).await.unwrap(); // now

        assert_eq!(store.count_since(window).await.unwrap(), 2);
        assert_eq!(store.count_since(Duration::from_secs(3600)).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_open_creates_file_and_persists() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("stories.db");

        {
            let store = SqliteStoryStore::open(&db_path).unwrap();
            store.upsert(&story(7)).await.unwrap();
        }

        // Reopen: schema creation is idempotent and data survives
        let store = SqliteStoryStore::open(&db_path).unwrap();
        assert_eq!(store.count_all().unwrap(), 1);
        assert_eq!(
            store.upsert(&story(7)).await.unwrap(),
            UpsertOutcome::AlreadyPresent
        );
    }
}
