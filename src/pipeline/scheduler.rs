//! Ingestion scheduler with overlap guard
//!
//! Fires an ingestion cycle every period. A trigger that lands while the
//! previous cycle is still running is skipped, never queued: the guard is a
//! single flag set on entry and cleared when the cycle (including its
//! broadcast) finishes.

use super::db::StoryStore;
use super::hn_client::StorySource;
use super::ingestion::run_ingestion_cycle;
use super::notifier::Notifier;
use super::types::LiveEvent;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// What happened to a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    /// A cycle was already in progress
    Skipped,
}

/// Point-in-time copy of the scheduler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub items_inserted: u64,
}

struct SchedulerInner {
    source: Arc<dyn StorySource>,
    store: Arc<dyn StoryStore>,
    notifier: Arc<Notifier>,
    fetch_timeout: Duration,

    in_progress: AtomicBool,
    cycles_started: AtomicU64,
    cycles_completed: AtomicU64,
    cycles_skipped: AtomicU64,
    items_inserted: AtomicU64,

    current_cycle: Mutex<Option<JoinHandle<()>>>,
    timer: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

/// Clears the overlap guard when the cycle task ends, even on panic
struct CycleGuard(Arc<SchedulerInner>);

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.in_progress.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct IngestionScheduler {
    inner: Arc<SchedulerInner>,
}

impl IngestionScheduler {
    pub fn new(
        source: Arc<dyn StorySource>,
        store: Arc<dyn StoryStore>,
        notifier: Arc<Notifier>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                source,
                store,
                notifier,
                fetch_timeout,
                in_progress: AtomicBool::new(false),
                cycles_started: AtomicU64::new(0),
                cycles_completed: AtomicU64::new(0),
                cycles_skipped: AtomicU64::new(0),
                items_inserted: AtomicU64::new(0),
                current_cycle: Mutex::new(None),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Trigger one cycle unless one is already running
    ///
    /// The cycle runs on its own task; this returns as soon as the guard is
    /// taken (or found taken).
    pub fn fire(&self) -> TriggerOutcome {
        let inner = &self.inner;
        if inner
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let skipped = inner.cycles_skipped.fetch_add(1, Ordering::Relaxed) + 1;
            log::warn!(
                "⏭️  Previous ingestion cycle still running, skipping trigger (skipped so far: {})",
                skipped
            );
            return TriggerOutcome::Skipped;
        }

        inner.cycles_started.fetch_add(1, Ordering::Relaxed);

        let guard = CycleGuard(inner.clone());
        let handle = tokio::spawn(async move {
            let inner = guard.0.clone();
            let report =
                run_ingestion_cycle(inner.source.as_ref(), inner.store.as_ref(), inner.fetch_timeout)
                    .await;

            inner
                .items_inserted
                .fetch_add(report.inserted as u64, Ordering::Relaxed);

            let delivered = inner.notifier.broadcast(&LiveEvent::update());
            log::info!("📣 Broadcast update to {} connections", delivered);

            inner.cycles_completed.fetch_add(1, Ordering::Relaxed);
            drop(guard);
        });

        if let Ok(mut current) = inner.current_cycle.lock() {
            *current = Some(handle);
        }

        TriggerOutcome::Started
    }

    /// Start firing every `period`; the first trigger is immediate
    ///
    /// Calling `start` on a running scheduler is a no-op.
    pub fn start(&self, period: Duration) {
        let Ok(mut timer) = self.inner.timer.lock() else {
            return;
        };
        if timer.is_some() {
            log::warn!("⚠️  Scheduler already started");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = self.clone();

        let handle = tokio::spawn(async move {
            log::info!("⏰ Starting ingestion scheduler (interval: {}ms)", period.as_millis());

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.fire();
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }

            log::info!("⏰ Ingestion scheduler stopped");
        });

        *timer = Some((shutdown_tx, handle));
    }

    /// Stop future triggers and wait for an in-flight cycle to finish
    pub async fn stop(&self) {
        let timer = self.inner.timer.lock().ok().and_then(|mut t| t.take());
        if let Some((shutdown_tx, handle)) = timer {
            let _ = shutdown_tx.send(true);
            if let Err(e) = handle.await {
                log::error!("❌ Scheduler task ended abnormally: {}", e);
            }
        }

        self.wait_for_cycle().await;
    }

    /// Wait until the most recently started cycle has finished
    pub async fn wait_for_cycle(&self) {
        let current = self
            .inner
            .current_cycle
            .lock()
            .ok()
            .and_then(|mut c| c.take());

        if let Some(handle) = current {
            if let Err(e) = handle.await {
                log::error!("❌ Ingestion cycle ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running_cycle(&self) -> bool {
        self.inner.in_progress.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SchedulerStats {
        let inner = &self.inner;
        SchedulerStats {
            cycles_started: inner.cycles_started.load(Ordering::Relaxed),
            cycles_completed: inner.cycles_completed.load(Ordering::Relaxed),
            cycles_skipped: inner.cycles_skipped.load(Ordering::Relaxed),
            items_inserted: inner.items_inserted.load(Ordering::Relaxed),
        }
    }
}
