mod common;

use common::StubRenderer;
use futures::future::BoxFuture;
use jobsnap::{PageRenderer, RenderedPage, SnapshotConfig, SnapshotError, Snapshotter};
use std::time::Duration;
use tempfile::tempdir;

const PAGE_URL: &str = "https://jobs.example/ad/7";

#[tokio::test]
async fn snapshot_writes_self_contained_file() {
    let html = r#"<html><body>
        <script>track();</script>
        <h1>Backend Engineer</h1>
    </body></html>"#;
    let renderer = StubRenderer::new().with_page(PAGE_URL, html);
    let snapshotter = Snapshotter::new(renderer, SnapshotConfig::default());

    let dir = tempdir().unwrap();
    let dest = dir.path().join("ad.html");
    snapshotter.snapshot(PAGE_URL, &dest).await.unwrap();

    let saved = std::fs::read_to_string(&dest).unwrap();
    assert!(saved.contains("Backend Engineer"));
    assert!(!saved.contains("<script"));
}

#[tokio::test]
async fn render_failure_writes_no_file() {
    let renderer = StubRenderer::new();
    let snapshotter = Snapshotter::new(renderer, SnapshotConfig::default());

    let dir = tempdir().unwrap();
    let dest = dir.path().join("ad.html");
    let result = snapshotter.snapshot("https://dead.example/", &dest).await;

    assert!(matches!(result, Err(SnapshotError::Render(_))));
    assert!(!dest.exists());
}

/// Renderer that stalls well past any test deadline.
struct StallingRenderer;

impl PageRenderer for StallingRenderer {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage, SnapshotError>> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(RenderedPage {
                url: url.to_string(),
                html: String::from("<html><body></body></html>"),
            })
        })
    }
}

#[tokio::test]
async fn deadline_overrun_times_out_and_writes_no_file() {
    let config = SnapshotConfig::default().with_total_deadline(Duration::from_millis(50));
    let snapshotter = Snapshotter::new(StallingRenderer, config);

    let dir = tempdir().unwrap();
    let dest = dir.path().join("ad.html");
    let result = snapshotter.snapshot(PAGE_URL, &dest).await;

    assert!(matches!(result, Err(SnapshotError::Timeout(_))));
    assert!(!dest.exists());
}

#[tokio::test]
async fn extract_text_returns_visible_page_text() {
    let html = r#"<html><head><style>p{margin:0}</style></head><body>
        <script>var secret = 1;</script>
        <h1>Data Engineer</h1>
        <p>Build pipelines.</p>
    </body></html>"#;
    let renderer = StubRenderer::new().with_page(PAGE_URL, html);
    let snapshotter = Snapshotter::new(renderer, SnapshotConfig::default());

    let text = snapshotter.extract_text(PAGE_URL).await.unwrap();
    assert!(text.contains("Data Engineer"));
    assert!(text.contains("Build pipelines."));
    assert!(!text.contains("secret"));
    assert!(!text.contains("margin"));
}

#[tokio::test]
async fn extract_text_appends_iframe_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/frame.html")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body><p>salary and benefits</p></body></html>")
        .create_async()
        .await;

    let html = format!(
        r#"<html><body><h1>Ad</h1><iframe src="{}/frame.html"></iframe></body></html>"#,
        server.url()
    );
    let renderer = StubRenderer::new().with_page(PAGE_URL, &html);
    let snapshotter = Snapshotter::new(renderer, SnapshotConfig::default());

    let text = snapshotter.extract_text(PAGE_URL).await.unwrap();
    assert!(text.contains("Ad"));
    assert!(text.contains("salary and benefits"));
}

#[tokio::test]
async fn extract_text_skips_unreachable_iframes() {
    let html = r#"<html><body><h1>Ad</h1>
        <iframe src="https://dead.example/frame.html"></iframe></body></html>"#;
    let renderer = StubRenderer::new().with_page(PAGE_URL, html);
    let snapshotter = Snapshotter::new(renderer, SnapshotConfig::default());

    let text = snapshotter.extract_text(PAGE_URL).await.unwrap();
    assert!(text.contains("Ad"));
}
