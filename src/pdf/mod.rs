//! Text extraction from linked PDF documents.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;

use crate::config::SnapshotConfig;
use crate::inliner::downloaders;

/// Download a PDF and extract its text content.
///
/// Parsing runs on the blocking pool; PDF decoding is CPU-bound and some
/// documents take long enough to stall the runtime otherwise.
pub async fn extract_text_from_pdf(
    client: &Client,
    url: &str,
    config: &SnapshotConfig,
) -> Result<String> {
    let bytes = downloaders::fetch_bytes(client, url, config)
        .await
        .with_context(|| format!("failed to download PDF from {url}"))?;
    debug!("extracting text from PDF ({} bytes): {url}", bytes.len());

    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| anyhow::anyhow!("PDF parsing failed: {e}"))
    })
    .await
    .context("PDF extraction task panicked")??;

    Ok(text.trim().to_string())
}
