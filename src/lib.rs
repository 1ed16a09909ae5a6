//! Job-ad snapshotting for automated application drafting.
//!
//! Renders a job-ad page in headless Chromium, inlines every external
//! resource (stylesheets, images, iframes, linked PDF text) into one
//! self-contained HTML file, and extracts the combined visible text for
//! language-model prompting.
//!
//! ```no_run
//! use jobsnap::{SnapshotConfig, Snapshotter};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), jobsnap::SnapshotError> {
//! let snapshotter = Snapshotter::with_chromium(SnapshotConfig::default());
//! snapshotter
//!     .snapshot("https://jobs.example/rust-engineer", Path::new("ad.html"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod browser_setup;
pub mod config;
pub mod error;
pub mod inliner;
pub mod pdf;
pub mod renderer;
pub mod settings;
pub mod snapshot;
pub mod template;

pub use config::{CHROME_USER_AGENT, DEFAULT_BANNER_IDS, SnapshotConfig};
pub use error::{SnapshotError, SnapshotResult};
pub use inliner::Inliner;
pub use inliner::css::inline_css_resources;
pub use renderer::{ChromiumRenderer, PageRenderer, RenderedPage};
pub use settings::Settings;
pub use snapshot::{Snapshotter, build_prompt};
pub use template::{AdMetadata, extract_metadata, populate_template, snapshot_filename};
