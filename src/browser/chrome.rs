//! chromiumoxide (CDP) implementation of the browser capability.
//!
//! Owns the launched browser and a single page; callers hold the session as
//! a scoped value and must `close()` it on every exit path.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tracing::{debug, info};

use super::{BrowserEngineConfig, BrowserSession};
use crate::error::BrowserError;

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// A launched Chrome with one open tab.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    nav_timeout: Duration,
}

impl ChromeSession {
    /// Find a Chrome executable on common paths or in PATH.
    fn find_chrome() -> Result<std::path::PathBuf> {
        for path in CHROME_PATHS {
            let p = Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    /// Launch Chrome and point file downloads at `download_dir`.
    pub async fn launch(config: &BrowserEngineConfig, download_dir: &Path) -> Result<Self> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless, confusingly
        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        // Drive the CDP connection until the browser goes away
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;

        // Route downloads into the destination directory instead of prompting
        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.to_string_lossy().to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build download behavior: {}", e))?;
        page.execute(behavior)
            .await
            .context("Failed to set download behavior")?;

        Ok(Self {
            browser,
            page,
            nav_timeout: Duration::from_secs(config.timeout),
        })
    }

    /// Close the browser. Must be called on every exit path.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
    }
}

fn protocol_err(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

/// Bound a page-load future by the configured navigation timeout.
async fn bounded_navigation<F>(
    timeout: Duration,
    url: &str,
    load: F,
) -> Result<(), BrowserError>
where
    F: Future<Output = Result<(), BrowserError>>,
{
    match tokio::time::timeout(timeout, load).await {
        Ok(result) => result,
        Err(_) => Err(BrowserError::Navigation {
            url: url.to_string(),
            reason: format!("page load exceeded {}s", timeout.as_secs()),
        }),
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {}", url);
        bounded_navigation(self.nav_timeout, url, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(())
        })
        .await
    }

    async fn query(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        // A selector matching nothing is an empty result, not an error
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            Err(_) => Ok(Vec::new()),
        }
    }

    async fn query_within(
        &self,
        element: &Element,
        selector: &str,
    ) -> Result<Vec<Element>, BrowserError> {
        match element.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            Err(_) => Ok(Vec::new()),
        }
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        let text = element.inner_text().await.map_err(protocol_err)?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        element.attribute(name).await.map_err(protocol_err)
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        element.click().await.map_err(protocol_err)?;
        Ok(())
    }

    async fn clear_and_type(&self, element: &Element, text: &str) -> Result<(), BrowserError> {
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(protocol_err)?;
        element.click().await.map_err(protocol_err)?;
        element.type_str(text).await.map_err(protocol_err)?;
        Ok(())
    }
}
