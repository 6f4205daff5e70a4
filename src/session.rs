//! Browser session abstraction and its Chrome DevTools Protocol backend
//!
//! `PageSession` is the seam between the capture strategy and a concrete
//! browser: it exposes the minimal surface the pipeline needs (navigation,
//! page metrics, scrolling, region capture). `CdpSession` implements it over
//! a headless Chrome instance via the `headless_chrome` crate.

use crate::{CaptureConfig, Error, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;

/// Dimensions reported by the loaded page
#[derive(Debug, Clone, Copy)]
pub struct PageMetrics {
    /// Width of the visible viewport in CSS pixels
    pub viewport_width: u32,
    /// Height of the visible viewport in CSS pixels
    pub viewport_height: u32,
    /// Full scrollable height of the document in CSS pixels
    pub full_height: u32,
}

/// Minimal browser surface required by the capture strategy
///
/// Implementations own exactly one page context. `close` consumes the
/// session so a released browser cannot be driven again.
pub trait PageSession {
    /// Navigate to a URL and wait until the page is ready
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Report viewport and document dimensions of the current page
    fn metrics(&mut self) -> Result<PageMetrics>;

    /// Scroll the viewport to a vertical offset; returns the actual offset
    /// after clamping at the bottom of the document
    fn scroll_to(&mut self, y: u32) -> Result<u32>;

    /// Capture a page-coordinate region at the given pixel scale
    fn capture_region(&mut self, y: u32, width: u32, height: u32, scale: u32)
        -> Result<RgbaImage>;

    /// Release the browser and all its resources
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

const METRICS_SCRIPT: &str = r#"
(function() {
    return JSON.stringify({
        width: document.documentElement.clientWidth,
        height: document.documentElement.clientHeight,
        full: Math.max(
            document.body ? document.body.scrollHeight : 0,
            document.documentElement.scrollHeight
        )
    });
})()
"#;

/// CDP-backed session (uses the `headless_chrome` crate)
///
/// Launches a headless Chrome instance sized to the configured viewport and
/// manages a single tab for the lifetime of one run.
pub struct CdpSession {
    browser: Browser,
    tab: Arc<Tab>,
    settle: Duration,
}

impl CdpSession {
    /// Launch a headless browser and open the tab used for captures
    pub fn launch(config: &CaptureConfig) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| Error::Initialization(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::Initialization(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::Initialization(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::Initialization(format!("Failed to set user agent: {}", e)))?;

        Ok(Self {
            browser,
            tab,
            settle: config.scroll_settle,
        })
    }

    /// Evaluate a script and return its JSON value
    fn evaluate_json(&self, script: &str) -> Result<serde_json::Value> {
        let eval = self.tab.evaluate(script, false)?;

        eval.value
            .ok_or_else(|| Error::Capture("No value returned from evaluation".into()))
    }
}

impl PageSession for CdpSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::Capture(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::Capture(format!("Wait for navigation failed: {}", e)))?;

        // Let late layout and font loads settle before any capture
        std::thread::sleep(self.settle);

        Ok(())
    }

    fn metrics(&mut self) -> Result<PageMetrics> {
        let value = self.evaluate_json(METRICS_SCRIPT)?;
        let raw = value
            .as_str()
            .ok_or_else(|| Error::Capture("Page metrics were not a JSON string".into()))?;
        let parsed: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| Error::Capture(format!("Failed to parse page metrics: {}", e)))?;

        let field = |name: &str| -> Result<u32> {
            parsed
                .get(name)
                .and_then(serde_json::Value::as_f64)
                .map(|v| v.max(0.0).round() as u32)
                .ok_or_else(|| Error::Capture(format!("Page metrics missing '{}'", name)))
        };

        Ok(PageMetrics {
            viewport_width: field("width")?,
            viewport_height: field("height")?,
            full_height: field("full")?,
        })
    }

    fn scroll_to(&mut self, y: u32) -> Result<u32> {
        let script = format!(
            "(function() {{ window.scrollTo(0, {}); return window.pageYOffset; }})()",
            y
        );
        let value = self.evaluate_json(&script)?;
        let offset = value
            .as_f64()
            .ok_or_else(|| Error::Capture("Scroll offset was not a number".into()))?;

        Ok(offset.max(0.0).round() as u32)
    }

    fn capture_region(
        &mut self,
        y: u32,
        width: u32,
        height: u32,
        scale: u32,
    ) -> Result<RgbaImage> {
        let clip = Page::Viewport {
            x: 0.0,
            y: y as f64,
            width: width as f64,
            height: height as f64,
            scale: scale as f64,
        };

        let png = self.tab.capture_screenshot(
            Page::CaptureScreenshotFormatOption::Png,
            None,
            Some(clip),
            true,
        )?;

        let segment = image::load_from_memory(&png)
            .map_err(|e| Error::Capture(format!("Failed to decode screenshot: {}", e)))?;

        Ok(segment.to_rgba8())
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process terminates
        // promptly.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
