//! Canva upload driver.
//!
//! Drives a headless Chromium session over CDP: log in, open the create
//! page, stage the downloaded asset on the uploads file input, screenshot.
//! The selectors mirror Canva's current page structure and will need
//! maintenance when it changes; everything here is best-effort by contract,
//! and [`run_upload`] keeps any failure from reaching the rest of the
//! pipeline.

use crate::config::Credentials;
use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const CANVA_HOME: &str = "https://www.canva.com/";
const CANVA_CREATE: &str = "https://www.canva.com/create/";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(45);
const LOGIN_STEP_TIMEOUT: Duration = Duration::from_secs(30);
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);
const UPLOADS_PANEL_TIMEOUT: Duration = Duration::from_secs(15);
const UPLOAD_SETTLE: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Find a clickable element by visible text - returns a CSS selector.
const FIND_CLICKABLE_BY_TEXT_JS: &str = r#"(() => {
    const wanted = __TEXT__.toLowerCase();
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_ELEMENT, null);
    while (walker.nextNode()) {
        const el = walker.currentNode;
        if (!el.matches('a, button, [role="button"], [role="link"]')) continue;
        if (!el.textContent?.trim().toLowerCase().includes(wanted)) continue;
        if (el.id) return '#' + CSS.escape(el.id);
        const path = [];
        let node = el;
        while (node && node !== document.body) {
            let selector = node.tagName.toLowerCase();
            if (node.id) {
                path.unshift('#' + CSS.escape(node.id));
                break;
            }
            const siblings = Array.from(node.parentNode?.children || []);
            const index = siblings.indexOf(node) + 1;
            if (siblings.length > 1) selector += ':nth-child(' + index + ')';
            path.unshift(selector);
            node = node.parentNode;
        }
        return path.join(' > ');
    }
    return null;
})()"#;

/// Resource count once the document has finished loading, -1 while it is
/// still loading (or mid-navigation).
const RESOURCE_COUNT_JS: &str =
    "document.readyState === 'complete' ? performance.getEntriesByType('resource').length : -1";

fn text_probe_js(text: &str) -> String {
    FIND_CLICKABLE_BY_TEXT_JS.replace("__TEXT__", &serde_json::to_string(text).unwrap())
}

/// Capability seam for the brittle upload sequence, so the pipeline never
/// depends on a concrete site's selectors.
#[async_trait]
pub trait UploadTarget {
    /// Run the full navigate-and-upload sequence for `asset`, returning the
    /// path of the success screenshot.
    async fn upload_asset(&self, asset: &Path) -> Result<PathBuf>;

    /// Best-effort diagnostic screenshot after a failed sequence.
    async fn capture_failure(&self, dest: &Path) -> Result<()>;
}

/// Outcome of [`run_upload`]. Failures are contained here; they never
/// propagate as errors.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The sequence completed and a screenshot was captured.
    Attempted(PathBuf),
    /// The sequence failed; the failure was logged and a diagnostic
    /// screenshot attempted.
    Failed,
}

/// Run the upload sequence against `target`, containing any automation
/// error: it is logged with its kind and message, answered with a failure
/// screenshot at `failure_shot`, and the pipeline carries on.
pub async fn run_upload<T: UploadTarget>(
    target: &T,
    asset: &Path,
    failure_shot: &Path,
) -> UploadOutcome {
    match target.upload_asset(asset).await {
        Ok(screenshot) => {
            info!("upload attempted; screenshot saved to {}", screenshot.display());
            UploadOutcome::Attempted(screenshot)
        }
        Err(e) => {
            warn!("canva automation failed: {}: {}", e.kind(), e);
            if let Err(shot_err) = target.capture_failure(failure_shot).await {
                warn!("could not capture failure screenshot: {}", shot_err);
            }
            UploadOutcome::Failed
        }
    }
}

/// A live browser session pointed at Canva.
///
/// Owns the browser process, one page, and the CDP handler task; all three
/// are released by [`close`](Self::close) on every exit path.
pub struct CanvaSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    credentials: Credentials,
    screenshot_path: PathBuf,
}

impl CanvaSession {
    /// Launch an isolated headless Chromium (`--no-sandbox`) with a blank
    /// page. `headed` opens a visible window for selector maintenance.
    pub async fn launch(
        credentials: Credentials,
        screenshot_path: PathBuf,
        headed: bool,
    ) -> Result<Self> {
        let mut builder = BrowserConfig::builder().no_sandbox().window_size(1280, 800);
        if headed {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(Error::Config)?;

        debug!("launching chromium (headed: {})", headed);
        let (browser, mut cdp) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = cdp.next().await {
                if event.is_err() {
                    debug!("cdp handler loop ended");
                    break;
                }
            }
        });
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler,
            credentials,
            screenshot_path,
        })
    }

    /// Close the browser and stop the handler task.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {}", e);
        }
        self.handler.abort();
    }

    async fn goto(&self, url: &str) -> Result<()> {
        tokio::time::timeout(NAVIGATION_TIMEOUT, self.page.goto(url))
            .await
            .map_err(|_| Error::Timeout(format!("navigation to {}", url)))??;
        Ok(())
    }

    /// Poll for an element until it appears or `timeout` elapses.
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(_) if Instant::now() < deadline => tokio::time::sleep(POLL_INTERVAL).await,
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "element '{}' did not appear",
                        selector
                    )))
                }
            }
        }
    }

    /// Resolve a clickable element by its visible text to a CSS selector.
    async fn find_by_text(&self, text: &str, timeout: Duration) -> Result<String> {
        let js = text_probe_js(text);
        let deadline = Instant::now() + timeout;
        loop {
            let found = match self.page.evaluate(js.as_str()).await {
                Ok(eval) => eval.into_value::<Option<String>>().unwrap_or(None),
                // Evaluation can fail mid-navigation; treat as not found yet.
                Err(_) => None,
            };
            if let Some(selector) = found {
                return Ok(selector);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "element with text '{}' not found",
                    text
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Login-completion heuristic: the resource count has to hold still for
    /// `NETWORK_IDLE_QUIET` on a fully loaded document.
    async fn wait_for_network_idle(&self) -> Result<()> {
        let deadline = Instant::now() + NETWORK_IDLE_TIMEOUT;
        let mut last_seen: i64 = -1;
        let mut quiet_since = Instant::now();
        loop {
            let count = match self.page.evaluate(RESOURCE_COUNT_JS).await {
                Ok(eval) => eval.into_value::<i64>().unwrap_or(-1),
                Err(_) => -1,
            };
            if count >= 0 && count == last_seen {
                if quiet_since.elapsed() >= NETWORK_IDLE_QUIET {
                    return Ok(());
                }
            } else {
                last_seen = count;
                quiet_since = Instant::now();
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout("network did not go idle".into()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn screenshot_to(&self, dest: &Path) -> Result<()> {
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
                dest,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UploadTarget for CanvaSession {
    async fn upload_asset(&self, asset: &Path) -> Result<PathBuf> {
        info!("navigating to {}", CANVA_HOME);
        self.goto(CANVA_HOME).await?;

        debug!("click: login link");
        let login = self.find_by_text("Log in", LOGIN_STEP_TIMEOUT).await?;
        self.page.find_element(&login).await?.click().await?;

        debug!("fill: email");
        let email = self
            .wait_for_element("input[name='email']", LOGIN_STEP_TIMEOUT)
            .await?;
        email.click().await?.type_str(&self.credentials.email).await?;

        debug!("fill: password");
        let password = self
            .wait_for_element("input[name='password']", LOGIN_STEP_TIMEOUT)
            .await?;
        password
            .click()
            .await?
            .type_str(&self.credentials.password)
            .await?
            .press_key("Enter")
            .await?;

        debug!("waiting for login to settle");
        self.wait_for_network_idle().await?;

        info!("navigating to {}", CANVA_CREATE);
        self.goto(CANVA_CREATE).await?;

        // The panel may already be open, so a missing button is tolerated.
        match self.find_by_text("Uploads", UPLOADS_PANEL_TIMEOUT).await {
            Ok(selector) => {
                debug!("click: uploads panel");
                if let Err(e) = self.page.find_element(&selector).await?.click().await {
                    warn!("uploads panel click failed: {}", e);
                }
            }
            Err(_) => warn!("uploads button not found; assuming the panel is open"),
        }

        debug!("setting file input: {}", asset.display());
        let input = self
            .wait_for_element("input[type='file']", LOGIN_STEP_TIMEOUT)
            .await?;
        // setFileInputFiles works even while the input is hidden. Chrome
        // wants an absolute path here.
        let file = asset
            .canonicalize()
            .unwrap_or_else(|_| asset.to_path_buf())
            .to_string_lossy()
            .into_owned();
        self.page
            .execute(SetFileInputFilesParams {
                files: vec![file],
                node_id: Some(input.node_id),
                backend_node_id: None,
                object_id: None,
            })
            .await?;

        debug!("waiting {}s for upload processing", UPLOAD_SETTLE.as_secs());
        tokio::time::sleep(UPLOAD_SETTLE).await;

        self.screenshot_to(&self.screenshot_path).await?;
        Ok(self.screenshot_path.clone())
    }

    async fn capture_failure(&self, dest: &Path) -> Result<()> {
        self.screenshot_to(dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct HappyTarget {
        screenshot: PathBuf,
    }

    #[async_trait]
    impl UploadTarget for HappyTarget {
        async fn upload_asset(&self, _asset: &Path) -> Result<PathBuf> {
            Ok(self.screenshot.clone())
        }

        async fn capture_failure(&self, _dest: &Path) -> Result<()> {
            panic!("capture_failure must not run on success");
        }
    }

    struct FailingTarget {
        captured: AtomicBool,
        screenshot_fails: bool,
    }

    #[async_trait]
    impl UploadTarget for FailingTarget {
        async fn upload_asset(&self, _asset: &Path) -> Result<PathBuf> {
            Err(Error::Timeout("element 'input[name=email]' did not appear".into()))
        }

        async fn capture_failure(&self, _dest: &Path) -> Result<()> {
            self.captured.store(true, Ordering::SeqCst);
            if self.screenshot_fails {
                Err(Error::Automation("page is gone".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_successful_upload_reports_screenshot() {
        let target = HappyTarget {
            screenshot: PathBuf::from("artifacts/canva_after_upload.png"),
        };
        let outcome = run_upload(&target, Path::new("assets/image.jpg"), Path::new("artifacts/error.png")).await;
        match outcome {
            UploadOutcome::Attempted(path) => {
                assert_eq!(path, PathBuf::from("artifacts/canva_after_upload.png"));
            }
            UploadOutcome::Failed => panic!("expected Attempted"),
        }
    }

    #[tokio::test]
    async fn test_failed_upload_is_contained_and_screenshotted() {
        let target = FailingTarget {
            captured: AtomicBool::new(false),
            screenshot_fails: false,
        };
        let outcome = run_upload(&target, Path::new("assets/image.jpg"), Path::new("artifacts/error.png")).await;
        assert!(matches!(outcome, UploadOutcome::Failed));
        assert!(target.captured.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failure_screenshot_failure_is_also_contained() {
        let target = FailingTarget {
            captured: AtomicBool::new(false),
            screenshot_fails: true,
        };
        let outcome = run_upload(&target, Path::new("assets/image.jpg"), Path::new("artifacts/error.png")).await;
        assert!(matches!(outcome, UploadOutcome::Failed));
    }

    #[test]
    fn test_text_probe_embeds_quoted_text() {
        let js = text_probe_js("Log in");
        assert!(js.contains(r#""Log in".toLowerCase()"#));
        assert!(!js.contains("__TEXT__"));
    }

    #[test]
    fn test_text_probe_escapes_quotes() {
        let js = text_probe_js(r#"Say "hi""#);
        assert!(js.contains(r#""Say \"hi\"""#));
    }
}
