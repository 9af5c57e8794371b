//! One ingestion cycle: fetch candidates, normalize, upsert
//!
//! Every per-item failure (fetch, timeout, validation, storage) is contained
//! to that item. Candidates are processed sequentially in source order so the
//! source sees at most one request in flight from us.

use super::db::StoryStore;
use super::error::FetchError;
use super::hn_client::StorySource;
use super::normalizer::{normalize, Normalized};
use super::types::UpsertOutcome;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Counters for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub candidates: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Items that were not stories
    pub skipped: usize,
    pub rejected: usize,
    /// Fetch and storage failures
    pub failed: usize,
}

/// Run a single cycle against `source` and `store`
///
/// `fetch_timeout` bounds each source call independently of the HTTP client,
/// so a stalled request costs at most one deadline per id.
pub async fn run_ingestion_cycle(
    source: &dyn StorySource,
    store: &dyn StoryStore,
    fetch_timeout: Duration,
) -> CycleReport {
    let started = Instant::now();
    let mut report = CycleReport::default();

    let ids = match with_deadline(fetch_timeout, source.list_candidate_ids()).await {
        Ok(ids) => ids,
        Err(e) => {
            log::error!("❌ Failed to fetch candidate ids: {}", e);
            return report;
        }
    };
    report.candidates = ids.len();
    log::info!("📥 Ingestion cycle started ({} candidates)", ids.len());

    for id in ids {
        let raw = match with_deadline(fetch_timeout, source.fetch_detail(id)).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("⚠️  Skipping item {}: {}", id, e);
                report.failed += 1;
                continue;
            }
        };

        let story = match normalize(raw) {
            Normalized::Accepted(story) => story,
            Normalized::Skipped => {
                log::debug!("   ├─ Item {} is not a story, ignoring", id);
                report.skipped += 1;
                continue;
            }
            Normalized::Rejected(rejection) => {
                log::warn!("⚠️  Skipping item {}: {}", id, rejection);
                report.rejected += 1;
                continue;
            }
        };

        match store.upsert(&story).await {
            Ok(UpsertOutcome::Inserted) => {
                log::debug!("   ├─ Saved story {} \"{}\"", story.story_id, story.title);
                report.inserted += 1;
            }
            Ok(UpsertOutcome::AlreadyPresent) => {
                report.duplicates += 1;
            }
            Err(e) => {
                log::error!("❌ Failed to save story {}: {}", story.story_id, e);
                report.failed += 1;
            }
        }
    }

    log::info!(
        "✅ Ingestion cycle finished in {}ms: {} new, {} known, {} skipped, {} rejected, {} failed",
        started.elapsed().as_millis(),
        report.inserted,
        report.duplicates,
        report.skipped,
        report.rejected,
        report.failed
    );

    report
}

async fn with_deadline<T>(
    deadline: Duration,
    call: impl std::future::Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(deadline.as_millis() as u64)),
    }
}
