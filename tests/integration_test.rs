use photo_gallery::analytics::cache::AnalyticsCache;
use photo_gallery::analytics::AnalyticsState;
use photo_gallery::config::AnalyticsConfig;
use photo_gallery::images::ImageState;
use photo_gallery::storage::blob::BlobStore;
use photo_gallery::storage::executor::QueryExecutor;
use reqwest::multipart::{Form, Part};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

struct TestServer {
    addr: SocketAddr,
    executor: QueryExecutor,
    dir: tempfile::TempDir,
    client: reqwest::Client,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn upload(&self, form: Form) -> (u16, serde_json::Value) {
        let resp = self
            .client
            .post(self.url("/new"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn drop_table(&self) {
        self.executor
            .query(|conn| conn.execute_batch("DROP TABLE data"))
            .await
            .unwrap();
    }
}

fn image_form(author: &str) -> Form {
    Form::new()
        .part(
            "image",
            Part::bytes(b"fakeimg".to_vec()).file_name("image.png"),
        )
        .text("name", "n")
        .text("description", "d")
        .text("author", author.to_string())
}

/// Spawn the server on a random port backed by a temp database and images dir.
async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();

    let pool = deadpool_sqlite::Config::new(dir.path().join("gallery.db"))
        .create_pool(deadpool_sqlite::Runtime::Tokio1)
        .unwrap();
    photo_gallery::storage::sqlite::init_pool(&pool).await.unwrap();

    let executor = QueryExecutor::new(pool);
    let cache = Arc::new(AnalyticsCache::new(256));
    let image_state = Arc::new(ImageState {
        executor: executor.clone(),
        blobs: BlobStore::new(dir.path().join("public").join("images")),
        cache: cache.clone(),
    });
    let analytics_state = Arc::new(AnalyticsState::new(
        executor.clone(),
        cache,
        &AnalyticsConfig::default(),
        std::time::Instant::now(),
    ));
    let app = photo_gallery::server::router(image_state, analytics_state, 1024 * 1024);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server a moment to start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    TestServer {
        addr,
        executor,
        dir,
        client: reqwest::Client::new(),
    }
}

// ── Gallery ──

#[tokio::test]
async fn test_index_page() {
    let server = spawn_server().await;
    let resp = server.client.get(server.url("/")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.contains("text/html"));
    assert!(resp.text().await.unwrap().contains("PhotoGallery"));
}

#[tokio::test]
async fn test_upload_and_list() {
    let server = spawn_server().await;

    let (status, body) = server.upload(image_form("a")).await;
    assert_eq!(status, 200);
    let file_name = body["data"]["fileName"].as_str().unwrap().to_string();
    assert!(file_name.ends_with(".png"));
    assert!(body["metadata"]["generated_in_ms"].is_u64());
    assert!(body["timestamp"].is_string());

    let stored = server.dir.path().join("public").join("images").join(&file_name);
    assert_eq!(std::fs::read(stored).unwrap(), b"fakeimg");

    let (status, body) = server.get_json("/all").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 1);
    let item = &body["data"]["items"][0];
    assert_eq!(item["path"], file_name.as_str());
    assert_eq!(item["name"], "n");
    assert_eq!(item["description"], "d");
    assert_eq!(item["author"], "a");

    // Uploaded file is publicly served
    let resp = server
        .client
        .get(server.url(&format!("/images/{file_name}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_upload_without_image_is_rejected() {
    let server = spawn_server().await;

    let (status, body) = server.upload(Form::new().text("name", "n")).await;
    assert_eq!(status, 400);
    assert_eq!(body, serde_json::json!({ "error": "image required" }));
}

#[tokio::test]
async fn test_list_all_store_failure() {
    let server = spawn_server().await;
    server.drop_table().await;

    let (status, body) = server.get_json("/all").await;
    assert_eq!(status, 500);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upload_store_failure() {
    let server = spawn_server().await;
    server.drop_table().await;

    let (status, body) = server.upload(image_form("a")).await;
    assert_eq!(status, 500);
    assert!(body["error"].is_string());
}

// ── Analytics ──

#[tokio::test]
async fn test_summary_is_cached_within_ttl() {
    let server = spawn_server().await;
    server.upload(image_form("alice")).await;

    let (status, first) = server.get_json("/api/analytics/summary").await;
    assert_eq!(status, 200);
    assert_eq!(first["metadata"]["cached"], false);
    assert_eq!(first["period"], "30d");
    assert_eq!(first["data"]["total"], 1);
    assert_eq!(first["data"]["authors"], 1);
    assert_eq!(first["data"]["uploads7d"], 1);

    let (_, second) = server.get_json("/api/analytics/summary").await;
    assert_eq!(second["metadata"]["cached"], true);
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn test_page_params_change_cache_key() {
    let server = spawn_server().await;

    let (_, a) = server.get_json("/api/analytics/usage?page=1&per_page=10").await;
    let (_, b) = server.get_json("/api/analytics/usage?page=1&per_page=10").await;
    let (_, c) = server.get_json("/api/analytics/usage?page=1&per_page=11").await;
    let (_, d) = server.get_json("/api/analytics/usage?page=2&per_page=10").await;

    assert_eq!(a["metadata"]["cached"], false);
    assert_eq!(b["metadata"]["cached"], true);
    assert_eq!(c["metadata"]["cached"], false);
    assert_eq!(d["metadata"]["cached"], false);
}

#[tokio::test]
async fn test_defaults_share_cache_entry_with_explicit_defaults() {
    let server = spawn_server().await;

    let (_, a) = server.get_json("/api/analytics/popular-content").await;
    let (_, b) = server
        .get_json("/api/analytics/popular-content?period=30d&page=1&per_page=10")
        .await;
    assert_eq!(a["metadata"]["cached"], false);
    assert_eq!(b["metadata"]["cached"], true);
}

#[tokio::test]
async fn test_upload_invalidates_every_analytics_entry() {
    let server = spawn_server().await;

    for path in [
        "/api/analytics/summary",
        "/api/analytics/usage",
        "/api/analytics/popular-content",
    ] {
        server.get_json(path).await;
        let (_, warm) = server.get_json(path).await;
        assert_eq!(warm["metadata"]["cached"], true, "{path} should be warm");
    }

    let (status, _) = server.upload(image_form("bob")).await;
    assert_eq!(status, 200);

    for path in [
        "/api/analytics/summary",
        "/api/analytics/usage",
        "/api/analytics/popular-content",
    ] {
        let (_, body) = server.get_json(path).await;
        assert_eq!(body["metadata"]["cached"], false, "{path} should recompute");
    }

    let (_, summary) = server.get_json("/api/analytics/summary").await;
    assert_eq!(summary["data"]["total"], 1);
}

#[tokio::test]
async fn test_usage_counts_uploads_per_day() {
    let server = spawn_server().await;
    server.upload(image_form("a")).await;
    server.upload(image_form("b")).await;

    let (status, body) = server.get_json("/api/analytics/usage?page=1&per_page=10").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["items"][0]["uploads"], 2);
    assert_eq!(body["data"]["per_page"], 10);
    assert_eq!(body["data"]["page"], 1);
}

#[tokio::test]
async fn test_pagination_is_clamped() {
    let server = spawn_server().await;

    let (_, usage) = server
        .get_json("/api/analytics/usage?page=0&per_page=5000")
        .await;
    assert_eq!(usage["data"]["page"], 1);
    assert_eq!(usage["data"]["per_page"], 200);

    let (_, popular) = server
        .get_json("/api/analytics/popular-content?per_page=5000")
        .await;
    assert_eq!(popular["data"]["per_page"], 100);

    let (_, popular) = server
        .get_json("/api/analytics/popular-content?per_page=0")
        .await;
    assert_eq!(popular["data"]["per_page"], 1);
}

#[tokio::test]
async fn test_popular_content_ranks_authors() {
    let server = spawn_server().await;
    server.upload(image_form("Alice")).await;
    server.upload(image_form("Alice")).await;
    server.upload(image_form("Bob")).await;

    let (status, body) = server
        .get_json("/api/analytics/popular-content?per_page=5")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["items"][0]["author"], "Alice");
    assert_eq!(body["data"]["items"][0]["uploads"], 2);
    assert_eq!(body["data"]["items"][1]["author"], "Bob");
}

#[tokio::test]
async fn test_explicit_dates_override_period() {
    let server = spawn_server().await;

    let (status, body) = server
        .get_json("/api/analytics/summary?period=7d&start_date=2024-01-01&end_date=2024-01-31")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["period"], "2024-01-01_2024-01-31");
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_invalid_dates_are_rejected() {
    let server = spawn_server().await;

    let (status, body) = server
        .get_json("/api/analytics/summary?start_date=yesterday&end_date=2024-01-31")
        .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("start_date"));
}

#[tokio::test]
async fn test_analytics_store_failure() {
    let server = spawn_server().await;
    server.drop_table().await;

    let (status, body) = server.get_json("/api/analytics/summary").await;
    assert_eq!(status, 500);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health() {
    let server = spawn_server().await;

    for _ in 0..2 {
        let (status, body) = server.get_json("/api/analytics/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["db"], "ok");
        assert_eq!(body["period"], "now");
        assert_eq!(body["metadata"]["cached"], false);
        assert!(body["data"]["uptime_seconds"].is_u64());
        assert!(body["data"]["memory_mb"].is_u64());
    }
}
