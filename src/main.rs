use clap::Parser;
use log::{error, info};
use pagediff::pipeline::{self, RunOptions};
use pagediff::{CaptureConfig, Error, Viewport};
use std::path::PathBuf;
use std::time::Duration;

/// Capture full-page screenshots of two URLs and diff them visually and by
/// HTML source. Artifacts land in the working directory under a shared
/// timestamp prefix.
#[derive(Parser)]
#[command(name = "pagediff", version)]
struct Cli {
    /// URL of the first page
    first_page_url: String,

    /// URL of the second page
    second_page_url: String,

    /// Output pixel scale for captured screenshots
    #[arg(long, default_value_t = 2)]
    scale: u32,

    /// Milliseconds to wait after each scroll step
    #[arg(long = "settle-ms", default_value_t = 300)]
    settle_ms: u64,

    /// Browser viewport width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Browser viewport height
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn validate_url(raw: &str) -> Result<(), Error> {
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|e| Error::InvalidInput(format!("'{}' is not a valid URL: {}", raw, e)))
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    for raw in [&cli.first_page_url, &cli.second_page_url] {
        if let Err(e) = validate_url(raw) {
            error!("{}", e);
            eprintln!("Usage: pagediff FIRST_PAGE_URL SECOND_PAGE_URL");
            std::process::exit(2);
        }
    }

    let options = RunOptions {
        first_url: cli.first_page_url,
        second_url: cli.second_page_url,
        capture: CaptureConfig {
            viewport: Viewport {
                width: cli.width,
                height: cli.height,
            },
            scale_factor: cli.scale,
            scroll_settle: Duration::from_millis(cli.settle_ms),
            ..CaptureConfig::default()
        },
        output_dir: PathBuf::from("."),
    };

    match pipeline::run(&options) {
        Ok(report) => {
            info!(
                "Screenshot for first page was saved: {}",
                report.first_screenshot.display()
            );
            info!(
                "Screenshot for second page was saved: {}",
                report.second_screenshot.display()
            );
            info!(
                "Differences result was saved: {}",
                report.diff_image.display()
            );
            info!("Finished!");
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
