//! Configuration for snapshot operations.
//!
//! All knobs have documented defaults; callers override with the `with_*`
//! builder methods.

use std::time::Duration;

/// Chrome user agent string presented to target sites.
///
/// A realistic desktop Chrome identity reduces anti-bot rejections. This is
/// best effort only: a blocked navigation still surfaces as a normal render
/// failure.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Element ids of consent-banner containers removed before inlining.
///
/// These are configuration, not logic: sites wrap cookie walls in containers
/// with well-known ids, and a static snapshot is more readable without them.
pub const DEFAULT_BANNER_IDS: [&str; 2] = ["cmpbox", "cmpbox2"];

/// Configuration for a snapshot pipeline: browser behavior, timeouts, and
/// download size limits.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Element ids removed from the document before inlining
    pub banner_ids: Vec<String>,
    /// Run the browser without a visible window
    pub headless: bool,
    /// User agent applied to the browser and to all resource fetches
    pub user_agent: String,
    /// Per-navigation render timeout (network-idle wait included)
    pub render_timeout: Duration,
    /// Whole-snapshot deadline, bounding recursive iframe blow-up
    pub total_deadline: Duration,
    /// Timeout for stylesheet downloads
    pub css_timeout: Duration,
    /// Timeout for image, CSS sub-resource, and PDF downloads
    pub resource_timeout: Duration,
    /// Maximum stylesheet size in bytes
    pub max_css_size: usize,
    /// Maximum size in bytes for any single inlined resource
    pub max_resource_size: usize,
    /// Maximum iframe nesting depth before recursion stops
    ///
    /// The visited-URL guard already breaks cycles; this bounds pages with
    /// deep acyclic nesting.
    pub max_frame_depth: u8,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            banner_ids: DEFAULT_BANNER_IDS.iter().map(ToString::to_string).collect(),
            headless: true,
            user_agent: CHROME_USER_AGENT.to_string(),
            render_timeout: Duration::from_secs(10),
            total_deadline: Duration::from_secs(120),
            css_timeout: Duration::from_secs(30),
            resource_timeout: Duration::from_secs(60),
            max_css_size: 2 * 1024 * 1024,
            max_resource_size: 5 * 1024 * 1024,
            max_frame_depth: 5,
        }
    }
}

impl SnapshotConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_banner_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.banner_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_total_deadline(mut self, deadline: Duration) -> Self {
        self.total_deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_max_frame_depth(mut self, depth: u8) -> Self {
        self.max_frame_depth = depth;
        self
    }
}
