//! Inlining of resources referenced from CSS text.
//!
//! Every `url(...)` occurrence is resolved against the stylesheet's own URL,
//! fetched, and substituted with a base64 data URI. Matches are independent:
//! one failed fetch leaves that occurrence untouched and never aborts the
//! remaining matches.

use futures::future::join_all;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;

use super::downloaders;
use super::resolve_url;
use crate::config::SnapshotConfig;

static CSS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url\(([^)]+)\)").expect("css url pattern is valid"));

/// Rewrite `url(...)` references in `css` into embedded data URIs.
///
/// Idempotent on CSS without `url(...)` occurrences: the input is returned
/// unchanged. References that are already data URIs are skipped.
pub async fn inline_css_resources(
    css: String,
    css_base_url: &str,
    client: &Client,
    config: &SnapshotConfig,
) -> String {
    let mut targets: Vec<(String, String)> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for caps in CSS_URL_RE.captures_iter(&css) {
        let occurrence = caps[0].to_string();
        if !seen.insert(occurrence.clone()) {
            continue;
        }
        let reference = caps[1]
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .trim();
        if reference.is_empty() || reference.starts_with("data:") {
            debug!("skipping css reference: {reference}");
            continue;
        }
        match resolve_url(css_base_url, reference) {
            Ok(resolved) => targets.push((occurrence, resolved)),
            Err(e) => warn!("cannot resolve css reference '{reference}': {e:#}"),
        }
    }

    if targets.is_empty() {
        return css;
    }

    let downloads = targets.into_iter().map(|(occurrence, resource_url)| {
        let client = client.clone();
        async move {
            match downloaders::fetch_data_uri(
                &client,
                &resource_url,
                config,
                "application/octet-stream",
            )
            .await
            {
                Ok(data_uri) => Some((occurrence, data_uri)),
                Err(e) => {
                    warn!("failed to fetch css resource {resource_url}: {e:#}");
                    None
                }
            }
        }
    });

    let mut css = css;
    for (occurrence, data_uri) in join_all(downloads).await.into_iter().flatten() {
        css = css.replace(&occurrence, &format!("url({data_uri})"));
    }
    css
}
