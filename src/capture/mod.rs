//! Capture driver: drives a headless browser through one page load and
//! collects the raw DOM plus the sub-resource bodies the browser already
//! downloaded.
//!
//! The CDP Network domain is enabled before navigation and a listener
//! records every successful stylesheet, image and font response. After the
//! page settles, the recorded bodies are harvested into the shared
//! budget-guarded cache so the sanitizer can inline them without refetching.

mod browser;
mod js;
mod pdf;

pub use browser::{download_managed_browser, find_browser_executable, launch_browser};
pub use pdf::print_page_to_pdf;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, RequestId, ResourceType,
};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::ArchiveConfig;
use crate::resources::{ResourceCache, ResourceRecord};
use crate::utils::url_utils::{guess_content_type_by_ext, strip_fragment};

struct ResponseMeta {
    request_id: RequestId,
    url: String,
    mime_type: String,
}

/// A launched browser scoped to one archival run.
///
/// Holds the CDP message pump alive and owns a throwaway user data
/// directory that is removed on drop.
pub struct CaptureDriver {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl CaptureDriver {
    pub async fn launch(config: &ArchiveConfig) -> Result<Self> {
        let (browser, handler_task, user_data_dir) = launch_browser(config).await?;
        Ok(Self {
            browser,
            handler_task,
            user_data_dir,
        })
    }

    /// Load `url`, wait for it to settle, and return the raw serialized DOM.
    ///
    /// Successful stylesheet/image/font response bodies observed during the
    /// load are admitted into `cache` on the way out.
    pub async fn capture_html(
        &self,
        url: &str,
        config: &ArchiveConfig,
        cache: &Arc<ResourceCache>,
    ) -> Result<String> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;
        page.execute(EnableParams::default())
            .await
            .context("Failed to enable network domain")?;

        let mut events = page
            .event_listener::<EventResponseReceived>()
            .await
            .context("Failed to attach network listener")?;
        let responses: Arc<Mutex<Vec<ResponseMeta>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder_sink = Arc::clone(&responses);
        let recorder = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if !(200..300).contains(&event.response.status) {
                    continue;
                }
                if !matches!(
                    event.r#type,
                    ResourceType::Stylesheet | ResourceType::Image | ResourceType::Font
                ) {
                    continue;
                }
                let meta = ResponseMeta {
                    request_id: event.request_id.clone(),
                    url: strip_fragment(&event.response.url),
                    mime_type: event.response.mime_type.clone(),
                };
                recorder_sink
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(meta);
            }
        });

        let result = self.load_and_snapshot(&page, url, config).await;
        recorder.abort();
        let html = result?;

        let metas = std::mem::take(&mut *responses.lock().unwrap_or_else(|e| e.into_inner()));
        info!("captured {} candidate sub-resource responses", metas.len());
        harvest_bodies(&page, metas, cache).await;

        let _ = page.close().await;
        Ok(html)
    }

    /// Load `url` the same way and print it to PDF bytes.
    pub async fn capture_pdf(&self, url: &str, config: &ArchiveConfig) -> Result<Vec<u8>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;
        self.navigate(&page, url, config).await?;
        self.settle(&page, config).await;
        self.scroll(&page, config).await;
        let bytes = print_page_to_pdf(&page).await?;
        let _ = page.close().await;
        Ok(bytes)
    }

    async fn load_and_snapshot(
        &self,
        page: &Page,
        url: &str,
        config: &ArchiveConfig,
    ) -> Result<String> {
        self.navigate(page, url, config).await?;
        self.settle(page, config).await;
        self.scroll(page, config).await;
        page.content().await.context("Failed to snapshot page content")
    }

    async fn navigate(&self, page: &Page, url: &str, config: &ArchiveConfig) -> Result<()> {
        let timeout = Duration::from_secs(config.navigation_timeout_secs);
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| anyhow::anyhow!("Navigation to {url} timed out"))?
            .with_context(|| format!("Navigation to {url} failed"))?;
        if let Ok(waited) = tokio::time::timeout(timeout, page.wait_for_navigation()).await {
            if let Err(err) = waited {
                debug!("navigation wait reported: {err:#}");
            }
        }
        Ok(())
    }

    /// Poll for quiescence (document complete, images settled); pages that
    /// never quiesce get a fixed settle delay instead of failing the run.
    async fn settle(&self, page: &Page, config: &ArchiveConfig) {
        let deadline = Instant::now() + Duration::from_secs(config.quiescence_timeout_secs);
        loop {
            let settled = page
                .evaluate(js::QUIESCENCE_CHECK)
                .await
                .ok()
                .and_then(|value| value.into_value::<bool>().ok())
                .unwrap_or(false);
            if settled {
                return;
            }
            if Instant::now() >= deadline {
                info!("page did not reach quiescence, using fixed settle delay");
                tokio::time::sleep(Duration::from_millis(config.fallback_settle_ms)).await;
                return;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn scroll(&self, page: &Page, config: &ArchiveConfig) {
        let script = js::scroll_script(
            config.scroll_steps,
            config.scroll_step_px,
            config.scroll_pause_ms,
        );
        if let Err(err) = page.evaluate(script).await {
            debug!("scroll script failed: {err:#}");
        }
        tokio::time::sleep(Duration::from_millis(config.post_scroll_settle_ms)).await;
    }

    /// Close the browser cleanly. Dropping the driver afterwards cleans up
    /// the message pump and the profile directory.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            debug!("browser close reported: {err:#}");
        }
        let _ = self.browser.wait().await;
    }
}

impl Drop for CaptureDriver {
    fn drop(&mut self) {
        self.handler_task.abort();
        if let Err(err) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("failed to remove user data dir: {err}");
        }
    }
}

/// Pull recorded response bodies out of the browser into the cache.
///
/// Individual `Network.getResponseBody` failures are expected (evicted
/// bodies, redirected requests) and skipped. Harvesting stops early once
/// the budget is spent.
async fn harvest_bodies(page: &Page, metas: Vec<ResponseMeta>, cache: &Arc<ResourceCache>) {
    for meta in metas {
        if cache.get(&meta.url).is_some() {
            continue;
        }
        if cache.is_budget_exhausted() {
            debug!("embed budget exhausted, stopping response harvest");
            break;
        }
        let Ok(response) = page
            .execute(GetResponseBodyParams::new(meta.request_id.clone()))
            .await
        else {
            debug!("no body available for {}", meta.url);
            continue;
        };

        let returns = &response.result;
        let bytes = if returns.base64_encoded {
            match BASE64.decode(returns.body.as_bytes()) {
                Ok(bytes) => bytes,
                Err(_) => continue,
            }
        } else {
            returns.body.clone().into_bytes()
        };

        let content_type = if meta.mime_type.trim().is_empty() {
            guess_content_type_by_ext(&meta.url).to_string()
        } else {
            meta.mime_type.clone()
        };
        cache.admit(&meta.url, ResourceRecord::new(bytes, content_type));
    }
}
