//! Full-page capture strategy: scroll, capture, stitch
//!
//! The shooter walks the document one viewport at a time, captures each
//! visible segment as a page-coordinate clip at the configured pixel scale,
//! and pastes the segments into a single full-page bitmap. This is the
//! viewport-pasting approach: pages taller than one viewport are handled by
//! scrolling, with the final partial segment pasted at the clamped scroll
//! offset the browser actually reached.

use crate::{CaptureConfig, Error, PageSession, Result};
use image::{imageops, RgbaImage};
use log::debug;
use std::time::{Duration, SystemTime};

/// A full-page screenshot of one URL
///
/// Immutable once captured; the pipeline owns every snapshot for the
/// duration of a run.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// URL the page was captured from
    pub source_url: String,
    /// Stitched full-page RGBA bitmap
    pub image: RgbaImage,
    /// Wall-clock time the capture finished
    pub captured_at: SystemTime,
}

/// Scroll-and-stitch capture strategy
///
/// Parameterized by the output scale and the delay allowed for the page to
/// settle after each scroll step.
#[derive(Debug, Clone)]
pub struct FullPageShooter {
    scale_factor: u32,
    scroll_settle: Duration,
}

impl FullPageShooter {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            scale_factor: config.scale_factor.max(1),
            scroll_settle: config.scroll_settle,
        }
    }

    /// Capture the page the session is currently positioned at
    ///
    /// Navigation is the caller's responsibility; `source_url` is only
    /// recorded on the returned snapshot.
    pub fn capture<S: PageSession>(
        &self,
        session: &mut S,
        source_url: &str,
    ) -> Result<PageSnapshot> {
        let metrics = session.metrics()?;
        if metrics.viewport_width == 0 || metrics.viewport_height == 0 {
            return Err(Error::Capture("Page reported a zero-sized viewport".into()));
        }

        let full_height = metrics.full_height.max(metrics.viewport_height);
        let scale = self.scale_factor;
        let mut canvas = RgbaImage::new(metrics.viewport_width * scale, full_height * scale);

        debug!(
            "capturing {}: viewport {}x{}, full height {}, scale {}",
            source_url, metrics.viewport_width, metrics.viewport_height, full_height, scale
        );

        let mut offset = 0u32;
        loop {
            let actual = session.scroll_to(offset)?;
            std::thread::sleep(self.scroll_settle);

            let segment_height = (full_height - actual).min(metrics.viewport_height);
            let segment =
                session.capture_region(actual, metrics.viewport_width, segment_height, scale)?;
            imageops::replace(&mut canvas, &segment, 0, (actual * scale) as i64);

            // A clamped scroll means the bottom of the document is reached.
            if actual < offset || actual + metrics.viewport_height >= full_height {
                break;
            }
            offset = actual + metrics.viewport_height;
        }

        Ok(PageSnapshot {
            source_url: source_url.to_string(),
            image: canvas,
            captured_at: SystemTime::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageMetrics;
    use image::Rgba;

    /// Scripted session returning solid-color segments, no browser needed.
    struct FakeSession {
        metrics: PageMetrics,
        fill: Rgba<u8>,
        scroll_log: Vec<u32>,
    }

    impl FakeSession {
        fn new(viewport_height: u32, full_height: u32) -> Self {
            Self {
                metrics: PageMetrics {
                    viewport_width: 100,
                    viewport_height,
                    full_height,
                },
                fill: Rgba([10, 20, 30, 255]),
                scroll_log: Vec::new(),
            }
        }

        fn max_scroll(&self) -> u32 {
            self.metrics
                .full_height
                .saturating_sub(self.metrics.viewport_height)
        }
    }

    impl PageSession for FakeSession {
        fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }

        fn metrics(&mut self) -> Result<PageMetrics> {
            Ok(self.metrics)
        }

        fn scroll_to(&mut self, y: u32) -> Result<u32> {
            let actual = y.min(self.max_scroll());
            self.scroll_log.push(actual);
            Ok(actual)
        }

        fn capture_region(
            &mut self,
            _y: u32,
            width: u32,
            height: u32,
            scale: u32,
        ) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(width * scale, height * scale, self.fill))
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }

    fn shooter(scale: u32) -> FullPageShooter {
        FullPageShooter {
            scale_factor: scale,
            scroll_settle: Duration::from_millis(0),
        }
    }

    #[test]
    fn short_page_captures_in_one_segment() {
        let mut session = FakeSession::new(200, 150);
        let snapshot = shooter(1)
            .capture(&mut session, "http://short.test")
            .expect("capture");

        // Canvas is padded up to one viewport height.
        assert_eq!(snapshot.image.dimensions(), (100, 200));
        assert_eq!(session.scroll_log, vec![0]);
        assert_eq!(snapshot.source_url, "http://short.test");
    }

    #[test]
    fn tall_page_stitches_all_segments() {
        let mut session = FakeSession::new(200, 450);
        let snapshot = shooter(1)
            .capture(&mut session, "http://tall.test")
            .expect("capture");

        assert_eq!(snapshot.image.dimensions(), (100, 450));
        // 0, 200, then clamped to 250 for the final partial segment.
        assert_eq!(session.scroll_log, vec![0, 200, 250]);

        // Every pixel of the canvas was covered by a pasted segment.
        let fill = session.fill;
        assert!(snapshot.image.pixels().all(|p| *p == fill));
    }

    #[test]
    fn scale_factor_multiplies_output_resolution() {
        let mut session = FakeSession::new(300, 300);
        let snapshot = shooter(2)
            .capture(&mut session, "http://scaled.test")
            .expect("capture");

        assert_eq!(snapshot.image.dimensions(), (200, 600));
    }

    #[test]
    fn exact_multiple_height_does_not_overscroll() {
        let mut session = FakeSession::new(200, 400);
        shooter(1)
            .capture(&mut session, "http://even.test")
            .expect("capture");

        assert_eq!(session.scroll_log, vec![0, 200]);
    }
}
