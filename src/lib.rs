//! PageDiff
//!
//! A page snapshot-and-diff pipeline: captures full-page screenshots of two
//! URLs through a headless browser, computes a pixel-level difference image
//! with marked regions, diffs the raw HTML line-by-line, and writes every
//! artifact to disk under a shared timestamp prefix.
//!
//! # Example
//!
//! ```no_run
//! use pagediff::{pipeline, CaptureConfig};
//!
//! # fn main() -> pagediff::Result<()> {
//! let options = pipeline::RunOptions {
//!     first_url: "https://example.com".to_string(),
//!     second_url: "https://example.org".to_string(),
//!     capture: CaptureConfig::default(),
//!     output_dir: std::path::PathBuf::from("."),
//! };
//!
//! let report = pipeline::run(&options)?;
//! println!("visual differences: {}", report.visual_differences);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod session;
pub use session::{CdpSession, PageMetrics, PageSession};

pub mod capture;
pub use capture::{FullPageShooter, PageSnapshot};

pub mod visual;
pub use visual::VisualDiff;

pub mod fetch;
pub use fetch::{HtmlDocument, HtmlFetcher};

pub mod linediff;
pub use linediff::{compare_lines, LineDiffEntry};

pub mod pipeline;

/// Configuration for one comparison run
///
/// A `CaptureConfig` is constructed once per run and passed explicitly into
/// the capture strategy and fetcher. The defaults match the tool's stock
/// behavior: a 2x output scale, a 300ms scroll-settle delay, and a
/// 1280x720 viewport.
///
/// # Examples
///
/// ```
/// let cfg = pagediff::CaptureConfig::default();
/// assert_eq!(cfg.scale_factor, 2);
/// assert_eq!(cfg.scroll_settle.as_millis(), 300);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Viewport dimensions for the browser window
    pub viewport: Viewport,
    /// Output pixel scale applied to captured segments
    pub scale_factor: u32,
    /// Delay after each scroll step so the page can settle
    pub scroll_settle: Duration,
    /// Timeout for page loads and HTML fetches in milliseconds
    pub timeout_ms: u64,
    /// User agent string to send with requests
    pub user_agent: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            scale_factor: 2,
            scroll_settle: Duration::from_millis(300),
            timeout_ms: 30000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 PageDiff/0.1"
                .to_string(),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
