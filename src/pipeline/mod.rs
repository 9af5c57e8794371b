//! # Story ingestion and notification pipeline
//!
//! Periodically pulls the newest stories from the source, normalizes and
//! deduplicates them into SQLite, and tells live connections that fresh data
//! exists. Reads are served through a TTL page cache.
//!
//! ## Flow
//!
//! ```text
//! scheduler tick ─► hn_client (ids, then one item at a time)
//!                     ─► normalizer ─► db (INSERT OR IGNORE)
//!                                        ─► notifier.broadcast(update)
//!
//! GET /stories ─► auth ─► cache ─miss─► db.read_page ─► cache.set
//! WS connect   ─► notifier.register ─► initial { count_since(5 min) }
//! ```
//!
//! ## Guarantees
//!
//! - At most one ingestion cycle runs at a time; overlapping triggers are
//!   skipped and counted
//! - A failing item never aborts its cycle
//! - A cached page may lag storage by up to one cache TTL
//!
//! ## Module Organization
//!
//! - `types` - Story records, page requests, live events
//! - `error` - Error enums per failure domain
//! - `config` - Environment configuration
//! - `hn_client` - Story source trait and HTTP client
//! - `normalizer` - Validation and defaulting
//! - `db` - Storage trait and SQLite implementation
//! - `cache` - TTL page cache
//! - `ingestion` - One fetch/normalize/upsert cycle
//! - `scheduler` - Periodic trigger with overlap guard
//! - `notifier` - Live connection registry and fan-out
//! - `auth` - Bearer token issue/verify
//! - `context` - Shared state owner

pub mod types;
pub mod error;
pub mod config;
pub mod hn_client;
pub mod normalizer;
pub mod db;
pub mod cache;
pub mod ingestion;
pub mod scheduler;
pub mod notifier;
pub mod auth;
pub mod context;

// Re-export commonly used types
pub use types::{LiveEvent, NewStory, PageRequest, RawStory, Story, UpsertOutcome};
pub use error::{AuthRejection, ConfigError, FetchError, StorageError};
pub use config::PipelineConfig;
pub use hn_client::{HackerNewsClient, StorySource};
pub use db::{SqliteStoryStore, StoryStore};
pub use cache::PageCache;
pub use ingestion::{run_ingestion_cycle, CycleReport};
pub use scheduler::{IngestionScheduler, SchedulerStats, TriggerOutcome};
pub use notifier::Notifier;
pub use auth::{Claims, TokenAuthority};
pub use context::{AppContext, PageOrigin};
