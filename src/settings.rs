//! Persistent application settings.
//!
//! A flat JSON file holding the prompt template, the recent-URL history, and
//! the user's working folder. Loaded once at startup and saved after each
//! mutation; a missing file yields defaults.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_URL_HISTORY: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Prompt template for application drafting
    #[serde(default)]
    pub prompt_template: String,
    /// Recently snapshotted URLs, most recent first
    #[serde(default)]
    pub last_urls: Vec<String>,
    /// Folder snapshots are written into
    #[serde(default)]
    pub working_folder: Option<PathBuf>,
    /// Path to the application text template
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist. A malformed file is an error, not a silent reset.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed settings file at {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }

    /// Record a URL at the front of the history, deduplicating and keeping
    /// at most the ten most recent entries.
    pub fn remember_url(&mut self, url: &str) {
        self.last_urls.retain(|u| u != url);
        self.last_urls.insert(0, url.to_string());
        self.last_urls.truncate(MAX_URL_HISTORY);
    }
}
