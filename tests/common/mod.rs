use futures::future::BoxFuture;
use jobsnap::{PageRenderer, RenderedPage, SnapshotError};
use std::collections::HashMap;

/// Renderer stub serving canned markup per URL; unknown URLs fail the way a
/// dead navigation would.
pub struct StubRenderer {
    pages: HashMap<String, String>,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

impl PageRenderer for StubRenderer {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage, SnapshotError>> {
        Box::pin(async move {
            self.pages
                .get(url)
                .map(|html| RenderedPage {
                    url: url.to_string(),
                    html: html.clone(),
                })
                .ok_or_else(|| SnapshotError::Render(format!("navigation to {url} failed")))
        })
    }
}
