//! Integration tests for the ingestion pipeline against a local fake source
//!
//! A small axum server stands in for the Hacker News API so the real
//! reqwest client, normalizer, SQLite store, scheduler and notifier are
//! exercised together.

#[cfg(test)]
mod pipeline_integration_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::get,
        Router,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use storyflow::pipeline::{
        run_ingestion_cycle, HackerNewsClient, IngestionScheduler, LiveEvent, Notifier,
        PageRequest, SqliteStoryStore, StorySource, StoryStore, TriggerOutcome,
    };
    use tokio::net::TcpListener;

    /// How the fake source answers `/item/{id}.json`
    #[derive(Clone)]
    enum FakeItem {
        Body(String),
        Status(u16),
        Stall,
    }

    struct FakeSource {
        new_stories: Vec<i64>,
        items: HashMap<i64, FakeItem>,
    }

    async fn new_stories(State(source): State<Arc<FakeSource>>) -> String {
        serde_json::to_string(&source.new_stories).unwrap()
    }

    async fn item(
        State(source): State<Arc<FakeSource>>,
        Path(file): Path<String>,
    ) -> (StatusCode, String) {
        let id: i64 = file.trim_end_matches(".json").parse().unwrap_or(-1);
        match source.items.get(&id).cloned() {
            Some(FakeItem::Body(body)) => (StatusCode::OK, body),
            Some(FakeItem::Status(code)) => (StatusCode::from_u16(code).unwrap(), String::new()),
            Some(FakeItem::Stall) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                (StatusCode::OK, "null".to_string())
            }
            None => (StatusCode::OK, "null".to_string()),
        }
    }

    /// Start the fake source and return its base URL
    async fn spawn_fake_source(new_stories_ids: Vec<i64>, items: Vec<(i64, FakeItem)>) -> String {
        let source = Arc::new(FakeSource {
            new_stories: new_stories_ids,
            items: items.into_iter().collect(),
        });

        let app = Router::new()
            .route("/v0/newstories.json", get(new_stories))
            .route("/v0/item/:file", get(item))
            .with_state(source);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/v0", addr)
    }

    fn story_json(id: i64, title: &str, url: Option<&str>) -> FakeItem {
        let mut item = serde_json::json!({
            "id": id,
            "type": "story",
            "title": title,
            "by": "ivan",
            "score": 12,
            "time": 1700000000,
            "descendants": 0,
        });
        if let Some(url) = url {
            item["url"] = serde_json::json!(url);
        }
        FakeItem::Body(item.to_string())
    }

    #[tokio::test]
    async fn test_client_truncates_candidates_to_batch_size() {
        let base = spawn_fake_source((1..=30).rev().collect(), vec![]).await;
        let client = HackerNewsClient::new(&base, 10, Duration::from_secs(5)).unwrap();

        let ids = client.list_candidate_ids().await.unwrap();
        assert_eq!(ids, (21..=30).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_cycle_isolates_each_failure_mode() {
        let base = spawn_fake_source(
            vec![101, 102, 103, 104, 105, 106, 107],
            vec![
                (101, story_json(101, "Rust 2.0 released", Some("https://example.com/rust"))),
                (102, FakeItem::Status(500)),
                (103, FakeItem::Body("{not json".to_string())),
                // 104 unknown: source answers null
                (105, story_json(105, "Ask HN: Favourite editor?", None)),
                (106, FakeItem::Body(r#"{"id":106,"type":"comment","by":"judy","text":"+1"}"#.to_string())),
                (107, FakeItem::Body(r#"{"id":107,"type":"story","by":"judy"}"#.to_string())),
            ],
        )
        .await;
        let client = HackerNewsClient::new(&base, 10, Duration::from_secs(5)).unwrap();
        let store = SqliteStoryStore::open_in_memory().unwrap();

        let report = run_ingestion_cycle(&client, &store, Duration::from_secs(5)).await;

        assert_eq!(report.candidates, 7);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rejected, 1);

        let page = store.read_page(PageRequest::default()).await.unwrap();
        let mut ids: Vec<i64> = page.iter().map(|s| s.story_id).collect();
        ids.sort();
        assert_eq!(ids, vec![101, 105]);

        let ask = page.iter().find(|s| s.story_id == 105).unwrap();
        assert_eq!(ask.url, "No URL provided");
        assert_eq!(ask.score, 12);
    }

    #[tokio::test]
    async fn test_stalled_item_is_cut_off_by_deadline() {
        let base = spawn_fake_source(
            vec![1, 2],
            vec![(1, FakeItem::Stall), (2, story_json(2, "Still arrives", None))],
        )
        .await;
        // HTTP client timeout is generous; the per-call deadline is what fires
        let client = HackerNewsClient::new(&base, 10, Duration::from_secs(60)).unwrap();
        let store = SqliteStoryStore::open_in_memory().unwrap();

        let started = std::time::Instant::now();
        let report = run_ingestion_cycle(&client, &store, Duration::from_millis(300)).await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(report.failed, 1);
        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn test_scheduled_cycles_are_idempotent_and_broadcast() {
        let base = spawn_fake_source(
            vec![1, 2, 3],
            vec![
                (1, story_json(1, "One", None)),
                (2, FakeItem::Status(503)),
                (3, story_json(3, "Three", Some("https://example.com/3"))),
            ],
        )
        .await;
        let client = Arc::new(HackerNewsClient::new(&base, 10, Duration::from_secs(5)).unwrap());
        let store = Arc::new(SqliteStoryStore::open_in_memory().unwrap());
        let notifier = Arc::new(Notifier::new(store.clone()));
        let scheduler = IngestionScheduler::new(
            client,
            store.clone(),
            notifier.clone(),
            Duration::from_secs(5),
        );

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        notifier.register(tx).await.unwrap();
        assert_eq!(rx.recv().await, Some(LiveEvent::Initial { count: 0 }));

        for _ in 0..2 {
            assert_eq!(scheduler.fire(), TriggerOutcome::Started);
            scheduler.wait_for_cycle().await;
            assert_eq!(rx.recv().await, Some(LiveEvent::update()));
        }

        assert_eq!(store.count_all().unwrap(), 2);
        assert_eq!(store.count_since(Duration::from_secs(300)).await.unwrap(), 2);

        let stats = scheduler.stats();
        assert_eq!(stats.cycles_completed, 2);
        assert_eq!(stats.items_inserted, 2);
    }
}
