use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use firmfetch_common::observability::{LogConfig, init_logging};
use firmfetch_config::FirmfetchConfigLoader;
use firmfetch_drivers::browser::driver::WebDriverBrowser;
use firmfetch_harvest::catalog::{render_catalog, select_targets};
use firmfetch_harvest::{Collector, Console};
use firmfetch_http::HttpClient;
use std::path::PathBuf;
use std::time::Duration;
mod cli;

const DEFAULT_CONFIG: &str = "firmfetch.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over file, flags win over both)
    let loader = FirmfetchConfigLoader::new();
    let loader = match &cli.config {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG),
    };
    let mut cfg = loader.load().context("loading configuration")?;
    cli.apply(&mut cfg);

    let targets = select_targets(&cfg.targets, &cli.only)?;
    if cli.list {
        print!("{}", render_catalog(&targets));
        return Ok(());
    }

    // 2) Logging
    let log_path = init_logging(LogConfig {
        app_name: "firmfetch",
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::info!(log = %log_path.display(), targets = targets.len(), "firmfetch starting");

    // 3) Download client first, so a build failure leaves no browser behind
    let fetcher = HttpClient::with_read_timeout(Duration::from_secs(cfg.download.timeout_secs))?
        .with_retries(cfg.download.retries);

    // 4) Browser session; nothing to do without one
    let browser = WebDriverBrowser::connect(&cfg.browser)
        .await
        .context("starting browser session")?;

    let collector = Collector::new(&browser, &fetcher, &cfg, targets, Console::stdout());
    let (outcome, _console) = collector.run_and_close().await;
    outcome?;
    Ok(())
}
