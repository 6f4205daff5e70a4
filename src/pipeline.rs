//! Run orchestration and artifact persistence
//!
//! One run is a fixed linear sequence: navigate and capture both pages,
//! release the browser, compute the visual diff, persist the three images,
//! fetch and line-diff the HTML, and write the text report when differences
//! were found. Any failure aborts the remaining steps and propagates to the
//! entry point; the browser session is still released on those paths. A
//! failed run may leave already-written artifacts behind; they are not
//! cleaned up.
//!
//! All artifacts of one run share a single epoch-millis filename prefix
//! computed at run start.

use crate::{
    compare_lines, fetch::HtmlFetcher, visual, CaptureConfig, CdpSession, Error, FullPageShooter,
    HtmlDocument, LineDiffEntry, PageSession, PageSnapshot, Result,
};
use image::{ImageFormat, RgbaImage};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const FIRST_PAGE_SUFFIX: &str = "_page_1";
const SECOND_PAGE_SUFFIX: &str = "_page_2";
const DIFF_SUFFIX: &str = "_diff";
const HTML_DIFF_SUFFIX: &str = "_html_diff";
const PNG_EXTENSION: &str = ".PNG";
const TEXT_EXTENSION: &str = ".TXT";

/// Inputs for one comparison run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub first_url: String,
    pub second_url: String,
    pub capture: CaptureConfig,
    /// Directory artifacts are written to, usually the working directory
    pub output_dir: PathBuf,
}

/// Paths and outcomes of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub first_screenshot: PathBuf,
    pub second_screenshot: PathBuf,
    pub diff_image: PathBuf,
    /// Present only when line differences were found
    pub html_report: Option<PathBuf>,
    pub visual_differences: bool,
    pub line_differences: usize,
}

/// Launch a browser and execute one full comparison run
pub fn run(options: &RunOptions) -> Result<RunReport> {
    let session = CdpSession::launch(&options.capture)?;
    run_with_session(session, options)
}

/// Execute a run against an already-launched session
///
/// The session is consumed and released exactly once, on success and on
/// every failure path.
pub fn run_with_session<S: PageSession>(session: S, options: &RunOptions) -> Result<RunReport> {
    let prefix = now_millis();

    let mut session = session;
    let captured = capture_both(&mut session, options);
    let closed = session.close();
    let (first, second) = captured?;
    closed?;

    let visual = visual::diff(&first, &second)?;

    let first_screenshot = artifact_path(options, &prefix, FIRST_PAGE_SUFFIX, PNG_EXTENSION);
    let second_screenshot = artifact_path(options, &prefix, SECOND_PAGE_SUFFIX, PNG_EXTENSION);
    let diff_image = artifact_path(options, &prefix, DIFF_SUFFIX, PNG_EXTENSION);
    save_png(&first.image, &first_screenshot)?;
    save_png(&second.image, &second_screenshot)?;
    save_png(&visual.marked, &diff_image)?;

    let fetcher = HtmlFetcher::new(&options.capture)?;
    let first_doc = fetch_logged(&fetcher, &options.first_url)?;
    let second_doc = fetch_logged(&fetcher, &options.second_url)?;
    let entries = compare_lines(&first_doc, &second_doc);

    let html_report = if entries.is_empty() {
        None
    } else {
        let path = artifact_path(options, &prefix, HTML_DIFF_SUFFIX, TEXT_EXTENSION);
        write_html_report(&path, &entries)?;
        info!("Differences html content was saved: {}", path.display());
        Some(path)
    };

    Ok(RunReport {
        first_screenshot,
        second_screenshot,
        diff_image,
        html_report,
        visual_differences: visual.has_differences,
        line_differences: entries.len(),
    })
}

fn capture_both<S: PageSession>(
    session: &mut S,
    options: &RunOptions,
) -> Result<(PageSnapshot, PageSnapshot)> {
    let shooter = FullPageShooter::new(&options.capture);

    session.navigate(&options.first_url)?;
    let first = shooter.capture(session, &options.first_url)?;

    session.navigate(&options.second_url)?;
    let second = shooter.capture(session, &options.second_url)?;

    Ok((first, second))
}

fn fetch_logged(fetcher: &HtmlFetcher, url: &str) -> Result<HtmlDocument> {
    fetcher.fetch(url).map_err(|e| {
        error!("Error when comparing html content, cause: {}", e);
        e
    })
}

fn now_millis() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0);
    format!("{}", millis)
}

fn artifact_path(options: &RunOptions, prefix: &str, suffix: &str, extension: &str) -> PathBuf {
    options
        .output_dir
        .join(format!("{}{}{}", prefix, suffix, extension))
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
}

/// Write the line-diff report, one formatted entry per line
fn write_html_report(path: &Path, entries: &[LineDiffEntry]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    for entry in entries {
        writeln!(file, "{}", entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageMetrics;
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeSession {
        fail_second_navigate: bool,
        navigations: u32,
        close_count: Rc<Cell<u32>>,
    }

    impl FakeSession {
        fn new(fail_second_navigate: bool) -> (Self, Rc<Cell<u32>>) {
            let close_count = Rc::new(Cell::new(0));
            (
                Self {
                    fail_second_navigate,
                    navigations: 0,
                    close_count: close_count.clone(),
                },
                close_count,
            )
        }
    }

    impl PageSession for FakeSession {
        fn navigate(&mut self, url: &str) -> Result<()> {
            self.navigations += 1;
            if self.fail_second_navigate && self.navigations == 2 {
                return Err(Error::Capture(format!("Navigation failed: {}", url)));
            }
            Ok(())
        }

        fn metrics(&mut self) -> Result<PageMetrics> {
            Ok(PageMetrics {
                viewport_width: 8,
                viewport_height: 8,
                full_height: 8,
            })
        }

        fn scroll_to(&mut self, _y: u32) -> Result<u32> {
            Ok(0)
        }

        fn capture_region(
            &mut self,
            _y: u32,
            width: u32,
            height: u32,
            scale: u32,
        ) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                width * scale,
                height * scale,
                Rgba([7, 7, 7, 255]),
            ))
        }

        fn close(self) -> Result<()> {
            self.close_count.set(self.close_count.get() + 1);
            Ok(())
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            first_url: "http://first.test".to_string(),
            second_url: "http://second.test".to_string(),
            capture: CaptureConfig {
                scroll_settle: std::time::Duration::from_millis(0),
                ..CaptureConfig::default()
            },
            output_dir: std::env::temp_dir(),
        }
    }

    #[test]
    fn session_is_released_once_when_second_capture_fails() {
        let (session, close_count) = FakeSession::new(true);
        let result = run_with_session(session, &options());

        assert!(matches!(result, Err(Error::Capture(_))));
        assert_eq!(close_count.get(), 1);
    }

    #[test]
    fn artifact_names_share_the_prefix() {
        let opts = options();
        let first = artifact_path(&opts, "123", FIRST_PAGE_SUFFIX, PNG_EXTENSION);
        let report = artifact_path(&opts, "123", HTML_DIFF_SUFFIX, TEXT_EXTENSION);

        assert!(first.ends_with("123_page_1.PNG"));
        assert!(report.ends_with("123_html_diff.TXT"));
        assert_eq!(first.parent(), report.parent());
    }

    #[test]
    fn html_report_has_one_line_per_entry() {
        let path = std::env::temp_dir().join(format!(
            "pagediff_report_{}_{}.TXT",
            std::process::id(),
            now_millis()
        ));
        let entries = vec![
            LineDiffEntry {
                index: 0,
                line_from_first: "a".to_string(),
                line_from_second: "b".to_string(),
            },
            LineDiffEntry {
                index: 3,
                line_from_first: "c".to_string(),
                line_from_second: "d".to_string(),
            },
        ];

        write_html_report(&path, &entries).expect("write report");
        let contents = std::fs::read_to_string(&path).expect("read report");
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Html content of 2 pages have difference ---> Page 1 is: a Page 2 is: b"
        );
        assert_eq!(
            lines[1],
            "Html content of 2 pages have difference ---> Page 1 is: c Page 2 is: d"
        );
    }
}
