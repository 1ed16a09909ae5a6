//! Resource downloads for the inlining engine.
//!
//! All downloads stream with a size cap, enforce the response status, and
//! present browser-like headers. Failures are plain `anyhow` errors; the
//! callers in the inlining engine absorb them per resource.

use anyhow::{Context, Result};
use base64::Engine as _;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

use crate::config::SnapshotConfig;

/// Download a stylesheet as UTF-8 text.
pub(crate) async fn fetch_text(
    client: &Client,
    url: &str,
    config: &SnapshotConfig,
) -> Result<String> {
    let (bytes, _content_type) = fetch_limited(
        client,
        url,
        config.css_timeout,
        config.max_css_size,
        &config.user_agent,
        "text/css,*/*;q=0.1",
    )
    .await?;
    String::from_utf8(bytes).context("response body is not valid UTF-8")
}

/// Download a binary resource and encode it as a base64 data URI.
///
/// The MIME type comes from the response's Content-Type header, falling back
/// to `default_mime` when the header is absent.
pub(crate) async fn fetch_data_uri(
    client: &Client,
    url: &str,
    config: &SnapshotConfig,
    default_mime: &str,
) -> Result<String> {
    let (bytes, content_type) = fetch_limited(
        client,
        url,
        config.resource_timeout,
        config.max_resource_size,
        &config.user_agent,
        "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
    )
    .await?;

    let mime = content_type.unwrap_or_else(|| default_mime.to_string());
    let encoded_capacity = base64::encoded_len(bytes.len(), false).unwrap_or(0);
    let mut data_uri = String::with_capacity(encoded_capacity + mime.len() + 16);
    data_uri.push_str("data:");
    data_uri.push_str(&mime);
    data_uri.push_str(";base64,");
    base64::engine::general_purpose::STANDARD.encode_string(&bytes, &mut data_uri);
    Ok(data_uri)
}

/// Download an HTML document as UTF-8 text (used for iframe text extraction).
pub(crate) async fn fetch_html(
    client: &Client,
    url: &str,
    config: &SnapshotConfig,
) -> Result<String> {
    let (bytes, _content_type) = fetch_limited(
        client,
        url,
        config.resource_timeout,
        config.max_resource_size,
        &config.user_agent,
        "text/html,application/xhtml+xml,*/*;q=0.8",
    )
    .await?;
    String::from_utf8(bytes).context("response body is not valid UTF-8")
}

/// Download raw bytes (used for linked PDFs).
pub(crate) async fn fetch_bytes(
    client: &Client,
    url: &str,
    config: &SnapshotConfig,
) -> Result<Vec<u8>> {
    let (bytes, _content_type) = fetch_limited(
        client,
        url,
        config.resource_timeout,
        config.max_resource_size,
        &config.user_agent,
        "application/pdf,*/*;q=0.8",
    )
    .await?;
    Ok(bytes)
}

/// Core download: status check, Content-Length pre-check, then streaming
/// accumulation with the size limit enforced before each chunk is kept.
async fn fetch_limited(
    client: &Client,
    url: &str,
    timeout: Duration,
    max_size: usize,
    user_agent: &str,
    accept: &str,
) -> Result<(Vec<u8>, Option<String>)> {
    let response = client
        .get(url)
        .timeout(timeout)
        .header(USER_AGENT, user_agent)
        .header(ACCEPT, accept)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "request to {url} failed with status {}",
            response.status()
        ));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let expected_size = response.content_length().unwrap_or(0);
    if expected_size > max_size as u64 {
        return Err(anyhow::anyhow!(
            "resource too large: {expected_size} bytes exceeds limit of {max_size} bytes"
        ));
    }

    let mut buffer = if expected_size > 0 {
        Vec::with_capacity(expected_size as usize)
    } else {
        Vec::new()
    };

    let mut stream = response.bytes_stream();
    let mut total_size = 0usize;
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.context("failed to read response chunk")?;
        let new_total = total_size + chunk.len();
        if new_total > max_size {
            return Err(anyhow::anyhow!(
                "download exceeded size limit: {new_total} bytes (max {max_size})"
            ));
        }
        buffer.extend_from_slice(&chunk);
        total_size = new_total;
    }

    Ok((buffer, content_type))
}
