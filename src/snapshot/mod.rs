//! Snapshot orchestration.
//!
//! `Snapshotter` ties the pipeline together: render the target URL, inline
//! every external reference, and write one self-contained HTML file. It also
//! aggregates the visible text of a page (including iframe and linked PDF
//! text) for prompt assembly.

use kuchiki::NodeRef;
use kuchiki::iter::NodeIterator;
use kuchiki::traits::TendrilSink;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::path::Path;

use crate::config::SnapshotConfig;
use crate::error::{SnapshotError, SnapshotResult};
use crate::inliner::{Inliner, downloaders, resolve_url, select_all};
use crate::pdf;
use crate::renderer::{ChromiumRenderer, PageRenderer};
use url::Url;

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n([ \t]*\n)+").expect("blank run pattern is valid"));

/// Orchestrates render, inline, and write for one target URL.
pub struct Snapshotter<R> {
    renderer: R,
    client: Client,
    config: SnapshotConfig,
}

impl Snapshotter<ChromiumRenderer> {
    /// Snapshotter backed by a headless Chromium renderer.
    #[must_use]
    pub fn with_chromium(config: SnapshotConfig) -> Self {
        let renderer = ChromiumRenderer::new(config.clone());
        Self::new(renderer, config)
    }
}

impl<R: PageRenderer> Snapshotter<R> {
    #[must_use]
    pub fn new(renderer: R, config: SnapshotConfig) -> Self {
        Self {
            renderer,
            client: Client::new(),
            config,
        }
    }

    /// Save a self-contained snapshot of `url` at `dest`.
    ///
    /// The file is written only after the complete document is assembled, so
    /// a failed operation never leaves a partial file behind. The whole
    /// operation runs under the configured deadline.
    pub async fn snapshot(&self, url: &str, dest: &Path) -> SnapshotResult<()> {
        match tokio::time::timeout(self.config.total_deadline, self.snapshot_inner(url, dest))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SnapshotError::Timeout(format!(
                "snapshot of {url} exceeded deadline of {}s",
                self.config.total_deadline.as_secs()
            ))),
        }
    }

    async fn snapshot_inner(&self, url: &str, dest: &Path) -> SnapshotResult<()> {
        let rendered = self.renderer.render(url).await?;
        info!("rendered {url} ({} bytes of markup)", rendered.html.len());

        let inliner = Inliner::new(&self.renderer, &self.config);
        let inlined = inliner.inline(rendered.html, url).await?;

        tokio::fs::write(dest, &inlined).await.map_err(|e| {
            SnapshotError::Write(format!("failed to write {}: {e}", dest.display()))
        })?;
        info!("wrote snapshot to {}", dest.display());
        Ok(())
    }

    /// Extract the combined visible text of a page for prompting.
    ///
    /// Returns the main page text followed by each iframe's text (fetched
    /// over plain HTTP) and each linked PDF's text, in document order.
    /// Per-resource failures degrade to skips; only the initial render is
    /// terminal.
    pub async fn extract_text(&self, url: &str) -> SnapshotResult<String> {
        let rendered = self.renderer.render(url).await?;
        let page = collect_page_text(rendered.html, url)?;

        let mut sections = vec![page.text];

        for iframe_url in page.iframe_urls {
            match downloaders::fetch_html(&self.client, &iframe_url, &self.config).await {
                Ok(html) => {
                    let frame = collect_page_text(html, &iframe_url)?;
                    if !frame.text.is_empty() {
                        sections.push(frame.text);
                    }
                }
                Err(e) => warn!("failed to fetch iframe {iframe_url}: {e:#}"),
            }
        }

        for pdf_url in page.pdf_urls {
            match pdf::extract_text_from_pdf(&self.client, &pdf_url, &self.config).await {
                Ok(text) if !text.is_empty() => sections.push(text),
                Ok(_) => warn!("PDF at {pdf_url} contains no extractable text"),
                Err(e) => warn!("failed to extract PDF text from {pdf_url}: {e:#}"),
            }
        }

        Ok(sections.join("\n\n"))
    }
}

struct PageText {
    text: String,
    iframe_urls: Vec<String>,
    pdf_urls: Vec<String>,
}

/// Pull the visible text out of an HTML document, along with the resolved
/// iframe and PDF references found in it. Script and style content is
/// excluded.
fn collect_page_text(html: String, base_url: &str) -> SnapshotResult<PageText> {
    let document = kuchiki::parse_html().one(html);

    let mut iframe_urls = Vec::new();
    for iframe in select_all(&document, "iframe[src]").map_err(SnapshotError::from)? {
        let src = iframe
            .attributes
            .borrow()
            .get("src")
            .map(ToString::to_string);
        if let Some(src) = src
            && !src.starts_with("about:")
            && !src.starts_with("data:")
            && !src.starts_with("javascript:")
            && let Ok(resolved) = resolve_url(base_url, &src)
        {
            iframe_urls.push(resolved);
        }
    }

    let mut pdf_urls = Vec::new();
    for anchor in select_all(&document, "a[href]").map_err(SnapshotError::from)? {
        let href = anchor
            .attributes
            .borrow()
            .get("href")
            .map(ToString::to_string);
        if let Some(href) = href
            && let Ok(resolved) = resolve_url(base_url, &href)
            && let Ok(parsed) = Url::parse(&resolved)
            && parsed.path().to_ascii_lowercase().ends_with(".pdf")
        {
            pdf_urls.push(resolved);
        }
    }

    for selector in ["script", "style"] {
        for element in select_all(&document, selector).map_err(SnapshotError::from)? {
            element.as_node().detach();
        }
    }

    Ok(PageText {
        text: visible_text(&document),
        iframe_urls,
        pdf_urls,
    })
}

fn visible_text(document: &NodeRef) -> String {
    let mut lines = Vec::new();
    for text_node in document.descendants().text_nodes() {
        let content = text_node.borrow();
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

/// Assemble the language-model prompt from the template, the extracted ad
/// text, and the source URL. Runs of blank lines collapse to one.
#[must_use]
pub fn build_prompt(template: &str, ad_text: &str, url: &str) -> String {
    let combined = format!("{template}\n\n{ad_text}\n\n{url}");
    BLANK_RUN_RE
        .replace_all(&combined, "\n\n")
        .trim()
        .to_string()
}
