//! Application template population and ad metadata handling.
//!
//! Generated application text carries a tab-separated metadata line (date,
//! company, URL, job title, contact). That line names the snapshot file and
//! fills the placeholder in the user's text template.

use anyhow::{Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Matches `date<TAB>company<TAB>url<TAB>title<TAB>contact` anywhere in the
/// generated text.
static METADATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}\.\d{2}\.\d{4})\t([^\t]+)\t([^\t]+)\t([^\t]+)\t([^\t\n]+)")
        .expect("metadata pattern is valid")
});

/// Filename used when the generated text carries no usable metadata line.
pub const FALLBACK_SNAPSHOT_NAME: &str = "job_ad_snapshot.html";

/// Metadata describing one job ad, parsed from generated application text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdMetadata {
    pub date: String,
    pub company: String,
    pub url: String,
    pub title: String,
    pub contact: String,
}

/// Extract the first tab-separated metadata line from generated text.
#[must_use]
pub fn extract_metadata(text: &str) -> Option<AdMetadata> {
    METADATA_RE.captures(text).map(|caps| AdMetadata {
        date: caps[1].to_string(),
        company: caps[2].trim().to_string(),
        url: caps[3].trim().to_string(),
        title: caps[4].trim().to_string(),
        contact: caps[5].trim().to_string(),
    })
}

/// Build the snapshot filename `{company}_{title}.html` from extracted
/// metadata. Missing metadata is recoverable: the fallback name is used and
/// a warning logged, so the snapshot is still written.
#[must_use]
pub fn snapshot_filename(metadata: Option<&AdMetadata>) -> String {
    match metadata {
        Some(meta) => {
            let raw = format!("{}_{}.html", meta.company, meta.title);
            sanitize_filename::sanitize(raw)
        }
        None => {
            warn!("no metadata line found in generated text, using fallback snapshot name");
            FALLBACK_SNAPSHOT_NAME.to_string()
        }
    }
}

/// Populate a text template by replacing every occurrence of `placeholder`
/// with `replacement`, writing the result next to the template as
/// `{stem}_filled{ext}`. Returns the populated file's path.
pub fn populate_template(
    template_path: &Path,
    placeholder: &str,
    replacement: &str,
) -> Result<PathBuf> {
    let template = std::fs::read_to_string(template_path)
        .with_context(|| format!("failed to read template {}", template_path.display()))?;
    let populated = template.replace(placeholder, replacement);

    let stem = template_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("template");
    let extension = template_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let output_path = template_path.with_file_name(format!("{stem}_filled{extension}"));

    std::fs::write(&output_path, populated)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    Ok(output_path)
}
