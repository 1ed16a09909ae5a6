//! Headless page rendering.
//!
//! A `PageRenderer` turns a URL into the DOM serialization of the fully
//! executed page. The trait keeps the inlining engine agnostic of the browser
//! driver, so iframe recursion and tests can substitute their own renderer.
//!
//! `ChromiumRenderer` spawns one headless browser session per call and tears
//! it down before returning, even on error.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use futures::future::BoxFuture;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::task::JoinHandle;

use crate::browser_setup;
use crate::config::SnapshotConfig;
use crate::error::SnapshotError;

/// The DOM serialization of a fully executed page at one point in time.
///
/// Produced by a renderer and consumed once; never mutated after creation.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// Renders a URL to its post-script-execution HTML markup.
///
/// Implementations must not panic across this boundary: every launch,
/// navigation, or timeout failure maps to `SnapshotError::Render`.
pub trait PageRenderer: Send + Sync {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage, SnapshotError>>;
}

/// Renderer backed by a headless Chromium session per call.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    config: SnapshotConfig,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    async fn render_once(&self, url: &str) -> Result<String> {
        let session = BrowserSession::launch(&self.config)
            .await
            .context("browser launch failed")?;

        let navigation = async {
            let page = session
                .browser()
                .new_page("about:blank")
                .await
                .context("failed to create page")?;

            // Best-effort anti-bot identity; a failure here must not abort
            // the render.
            if let Err(e) = page.set_user_agent(self.config.user_agent.as_str()).await {
                warn!("failed to set page user agent: {e}");
            }

            page.goto(url)
                .await
                .with_context(|| format!("navigation to {url} failed"))?;
            page.wait_for_navigation()
                .await
                .context("page did not reach network idle")?;
            let html = page.content().await.context("failed to read page content")?;
            if let Err(e) = page.close().await {
                debug!("failed to close page: {e}");
            }
            Ok::<String, anyhow::Error>(html)
        };

        let outcome = tokio::time::timeout(self.config.render_timeout, navigation).await;

        // Teardown is unconditional: the session must not outlive the call.
        session.close().await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "navigation to {url} timed out after {}s",
                self.config.render_timeout.as_secs()
            )),
        }
    }
}

impl PageRenderer for ChromiumRenderer {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage, SnapshotError>> {
        Box::pin(async move {
            match self.render_once(url).await {
                Ok(html) => Ok(RenderedPage {
                    url: url.to_string(),
                    html,
                }),
                Err(e) => Err(SnapshotError::Render(format!("{e:#}"))),
            }
        })
    }
}

/// A browser plus its event-handler task and temporary profile directory.
///
/// The handler must be aborted after the browser exits or it runs forever;
/// `Drop` is the fallback when `close()` is skipped on a panic path.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserSession {
    async fn launch(config: &SnapshotConfig) -> Result<Self> {
        let (browser, handler, user_data_dir) =
            browser_setup::launch_browser(config.headless, &config.user_agent).await?;
        Ok(Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        })
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Shut the browser down and release all session resources.
    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("failed to close browser cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            debug!("browser wait failed: {e}");
        }
        self.handler.abort();
        self.cleanup_temp_dir();
    }

    /// Remove the profile directory. Must run after the browser process has
    /// exited; Chrome keeps file handles open until then.
    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "failed to remove browser profile dir {}: {e}",
                    path.display()
                );
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            debug!("browser session dropped without explicit close, cleaning up in Drop");
            self.cleanup_temp_dir();
        }
    }
}
