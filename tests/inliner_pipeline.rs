mod common;

use common::StubRenderer;
use jobsnap::{Inliner, SnapshotConfig};

const PAGE_URL: &str = "https://jobs.example/ad/42";

#[tokio::test]
async fn output_contains_no_scripts_or_stylesheet_links() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/main.css")
        .with_status(200)
        .with_header("content-type", "text/css")
        .with_body("h1 { color: blue; }")
        .create_async()
        .await;

    let html = format!(
        r#"<html><head>
            <link rel="stylesheet" href="{}/main.css">
            <script src="tracker.js"></script>
        </head><body><script>init();</script><h1>Rust Engineer</h1></body></html>"#,
        server.url()
    );

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html, PAGE_URL).await.unwrap();

    assert!(!result.contains("<script"));
    assert!(!result.contains("<link"));
    assert!(result.contains("<style"));
    assert!(result.contains("h1 { color: blue; }"));
    assert!(result.contains("Rust Engineer"));
}

#[tokio::test]
async fn stylesheet_404_leaves_link_and_succeeds() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/gone.css")
        .with_status(404)
        .create_async()
        .await;

    let html = format!(
        r#"<html><head><link rel="stylesheet" href="{}/gone.css"></head>
            <body><p>content</p></body></html>"#,
        server.url()
    );

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html, PAGE_URL).await.unwrap();

    assert!(result.contains("gone.css"));
    assert!(result.contains("<link"));
}

#[tokio::test]
async fn image_becomes_data_uri_and_failed_image_is_left_alone() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/logo.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body([1u8, 2, 3, 4])
        .create_async()
        .await;
    server
        .mock("GET", "/broken.png")
        .with_status(500)
        .create_async()
        .await;

    let html = format!(
        r#"<html><body>
            <img src="{url}/logo.png">
            <img src="{url}/broken.png">
        </body></html>"#,
        url = server.url()
    );

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html, PAGE_URL).await.unwrap();

    assert!(result.contains("data:image/png;base64,AQIDBA=="));
    assert!(result.contains("broken.png"));
}

#[tokio::test]
async fn banner_containers_are_removed() {
    let html = r#"<html><body>
        <div id="cmpbox">Accept cookies</div>
        <div id="cmpbox2">Overlay</div>
        <main>the job ad</main>
    </body></html>"#;

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html.to_string(), PAGE_URL).await.unwrap();

    assert!(!result.contains("Accept cookies"));
    assert!(!result.contains("Overlay"));
    assert!(result.contains("the job ad"));
}

#[tokio::test]
async fn iframe_content_is_inlined_into_container_div() {
    let frame_url = "https://jobs.example/ad/frame.html";
    let html = r#"<html><body><iframe src="frame.html"></iframe></body></html>"#;

    let renderer = StubRenderer::new().with_page(
        frame_url,
        "<html><body><p>embedded description</p></body></html>",
    );
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html.to_string(), PAGE_URL).await.unwrap();

    assert!(!result.contains("<iframe"));
    assert!(result.contains("data-inlined-iframe"));
    assert!(result.contains("embedded description"));
}

#[tokio::test]
async fn self_embedding_iframe_terminates_without_recursion() {
    let html = format!(r#"<html><body><iframe src="{PAGE_URL}"></iframe><p>outer</p></body></html>"#);

    let renderer = StubRenderer::new().with_page(PAGE_URL, &html);
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html.clone(), PAGE_URL).await.unwrap();

    // Cycle detection skips the revisit and leaves the iframe in place.
    assert!(result.contains("<iframe"));
    assert!(result.contains("outer"));
}

#[tokio::test]
async fn two_page_iframe_cycle_terminates() {
    let page_a = "https://jobs.example/a";
    let page_b = "https://jobs.example/b";
    let html_a = format!(r#"<html><body><p>page a</p><iframe src="{page_b}"></iframe></body></html>"#);
    let html_b = format!(r#"<html><body><p>page b</p><iframe src="{page_a}"></iframe></body></html>"#);

    let renderer = StubRenderer::new()
        .with_page(page_a, &html_a)
        .with_page(page_b, &html_b);
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html_a.clone(), page_a).await.unwrap();

    assert!(result.contains("page a"));
    assert!(result.contains("page b"));
}

#[tokio::test]
async fn frame_depth_cap_stops_acyclic_nesting() {
    let frame_one = "https://jobs.example/frames/1";
    let frame_two = "https://jobs.example/frames/2";
    let html_top =
        format!(r#"<html><body><p>top</p><iframe src="{frame_one}"></iframe></body></html>"#);
    let html_one =
        format!(r#"<html><body><p>level one</p><iframe src="{frame_two}"></iframe></body></html>"#);
    let html_two = r#"<html><body><p>level two</p></body></html>"#;

    let renderer = StubRenderer::new()
        .with_page(frame_one, &html_one)
        .with_page(frame_two, html_two);
    let config = SnapshotConfig::default().with_max_frame_depth(1);
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html_top.clone(), PAGE_URL).await.unwrap();

    // The first level is inlined; the frame at the cap stays a live iframe.
    assert!(result.contains("level one"));
    assert!(result.contains(&format!(r#"<iframe src="{frame_two}">"#)));
    assert!(!result.contains("level two"));
}

#[tokio::test]
async fn unrenderable_iframe_is_left_in_place() {
    let html = r#"<html><body><iframe src="https://dead.example/frame"></iframe></body></html>"#;

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html.to_string(), PAGE_URL).await.unwrap();

    assert!(result.contains(r#"<iframe src="https://dead.example/frame">"#));
}

#[tokio::test]
async fn overflow_hidden_is_stripped_from_body_style() {
    let html = r#"<html><body style="overflow: hidden; color: red"><p>x</p></body></html>"#;

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html.to_string(), PAGE_URL).await.unwrap();

    assert!(result.contains(r#"style="color: red""#));
    assert!(!result.to_lowercase().contains("overflow"));
}

#[tokio::test]
async fn unparseable_pdf_leaves_anchor_untouched() {
    let mut server = mockito::Server::new_async().await;
    // Not a parseable PDF; extraction fails and the anchor stays untouched.
    server
        .mock("GET", "/cv.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("not a pdf")
        .create_async()
        .await;

    let html = format!(
        r#"<html><body><a href="{}/cv.pdf">details</a></body></html>"#,
        server.url()
    );

    let renderer = StubRenderer::new();
    let config = SnapshotConfig::default();
    let inliner = Inliner::new(&renderer, &config);
    let result = inliner.inline(html, PAGE_URL).await.unwrap();

    assert!(result.contains("details"));
    assert!(!result.contains("inlined-pdf-text"));
}
