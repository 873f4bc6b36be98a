//! The sequential run loop: one drivers page per OS target.

use crate::catalog::OsTarget;
use crate::plan::{plan_downloads, target_dir, DownloadItem, PlanEntry};
use crate::prompt::ask_take_all;
use crate::report::{Console, RunSummary, Tally};
use crate::scan::{dedup_in_order, inventory, scan_links};
use crate::select::{select_os, source_mentions};
use firmfetch_common::{FirmfetchError, Result};
use firmfetch_config::{EmptyPolicy, FirmfetchConfig, SearchEntry};
use firmfetch_drivers::browser::{
    first_match,
    pacing::{Pacer, Pause},
    probe::Probe,
    Browser, PageElement,
};
use firmfetch_http::{Fetcher, Progress};
use std::io::{self, BufRead, Write};

/// Visits every target with one browser session and fetches what it finds.
///
/// Failures inside a target are logged and reported, then the loop moves on;
/// only console write errors end the run early.
pub struct Collector<'a, B: Browser, F: Fetcher, W: Write + Send> {
    browser: &'a B,
    fetcher: &'a F,
    cfg: &'a FirmfetchConfig,
    targets: Vec<OsTarget>,
    pacer: Pacer,
    console: Console<W>,
    input: Box<dyn BufRead + 'a>,
}

impl<'a, B: Browser, F: Fetcher, W: Write + Send> Collector<'a, B, F, W> {
    pub fn new(
        browser: &'a B,
        fetcher: &'a F,
        cfg: &'a FirmfetchConfig,
        targets: Vec<OsTarget>,
        console: Console<W>,
    ) -> Self {
        Self {
            browser,
            fetcher,
            cfg,
            targets,
            pacer: Pacer::new(cfg.timing.clone()),
            console,
            input: Box::new(io::BufReader::new(io::stdin())),
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Source of answers for the empty-page prompt (stdin by default).
    pub fn with_input(mut self, input: Box<dyn BufRead + 'a>) -> Self {
        self.input = input;
        self
    }

    pub fn into_console(self) -> Console<W> {
        self.console
    }

    /// Label used in the summary, e.g. `.bin` or `.bin/.exe`.
    fn package_label(&self) -> String {
        let exts: Vec<String> = self
            .cfg
            .scan
            .extensions
            .iter()
            .map(|e| format!(".{}", e.trim()))
            .collect();
        exts.join("/")
    }

    fn fallback_ext(&self) -> &str {
        self.cfg
            .scan
            .extensions
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
            .unwrap_or("bin")
    }

    /// Visit every target, print the summary and return it.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let targets = self.targets.clone();
        let total = targets.len();
        self.console.start(total)?;

        let cfg = self.cfg;
        if let Some(search) = cfg.site.search.as_ref() {
            if let Err(err) = self.enter_via_search(search).await {
                tracing::warn!(target: "harvest.collector", error = %err, "search entry failed");
                self.console
                    .note(&format!("Search entry failed ({err}); using direct navigation"))?;
            }
        }

        for (idx, target) in targets.iter().enumerate() {
            self.console.target_banner(idx + 1, total, &target.name)?;
            match self.process(target).await {
                Ok(Some(tally)) => summary.record(&target.name, tally),
                Ok(None) => {}
                Err(FirmfetchError::Io(err)) => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(
                        target: "harvest.collector",
                        code = %target.code,
                        name = %target.name,
                        error = %err,
                        "target skipped"
                    );
                    self.console
                        .note(&format!("Error processing {}: {err}", target.name))?;
                }
            }
            if idx + 1 < total {
                self.pacer.pause(Pause::BetweenTargets).await;
            }
        }

        let label = self.package_label();
        self.console.summary(&summary, &label)?;
        tracing::info!(
            target: "harvest.collector",
            found = summary.total_found(),
            downloaded = summary.total_downloaded(),
            os_with_files = summary.os_with_files(),
            "run finished"
        );
        Ok(summary)
    }

    /// Run, then close the browser session whatever the outcome.
    ///
    /// Hands back the console so callers can inspect or flush what was
    /// printed.
    pub async fn run_and_close(mut self) -> (Result<RunSummary>, Console<W>) {
        let outcome = self.run().await;
        if let Err(err) = &outcome {
            tracing::error!(target: "harvest.collector", error = %err, "run aborted");
            let _ = self.console.note(&format!("Critical error: {err}"));
        }
        if let Err(err) = self.browser.close().await {
            tracing::warn!(target: "harvest.collector", error = %err, "closing browser failed");
        }
        let _ = self.console.note("Browser closed.");
        (outcome, self.console)
    }

    async fn enter_via_search(&mut self, search: &SearchEntry) -> Result<()> {
        let browser = self.browser;
        self.console
            .note(&format!("Opening support site: {}", search.home_url))?;
        browser.goto(&search.home_url).await?;
        self.pacer.pause(Pause::PageLoad).await;

        let chain: Vec<Probe> = self.cfg.selectors.search_inputs.iter().map(Probe::from).collect();
        let Some((input, idx)) = first_match(browser, &chain, self.pacer.element_wait()).await else {
            self.console
                .note("Could not find search input; continuing with direct navigation")?;
            return Ok(());
        };
        self.console
            .note(&format!("Found search input with selector: {}", chain[idx]))?;
        input.clear().await?;
        input.type_text(&search.query).await?;
        input.press_enter().await?;
        self.pacer.pause(Pause::PageLoad).await;
        Ok(())
    }

    /// Open the drivers page for `target`.
    ///
    /// Returns true when a direct OS query URL already shows the filtered
    /// listing, so the UI filter can be skipped.
    async fn open_drivers_page(&mut self, target: &OsTarget) -> Result<bool> {
        let browser = self.browser;
        let site = &self.cfg.site;

        if let Some(param) = site.os_query_param.as_deref() {
            let sep = if site.drivers_url.contains('?') { '&' } else { '?' };
            let url = format!("{}{sep}{param}={}", site.drivers_url, target.code);
            self.console
                .note(&format!("Trying filtered page: {url}"))?;
            browser.goto(&url).await?;
            self.pacer.pause(Pause::PageLoad).await;
            let source = browser.source().await?;
            let keyword = target.verify.as_deref().unwrap_or(&target.name);
            if source_mentions(&source, keyword) {
                return Ok(true);
            }
            self.console
                .note("Filter via URL did not apply, loading regular page...")?;
        }

        self.console
            .note(&format!("Loading base drivers page: {}", site.drivers_url))?;
        browser.goto(&site.drivers_url).await?;
        self.pacer.pause(Pause::PageLoad).await;
        Ok(false)
    }

    /// Links to take when the scan found nothing, per the empty-page policy.
    async fn links_for_empty_page(&mut self) -> Result<Vec<String>> {
        let policy = self.cfg.on_empty;
        if policy == EmptyPolicy::Skip {
            return Ok(Vec::new());
        }
        let inv = inventory(self.browser, &self.cfg.scan).await?;
        if inv.links.is_empty() {
            return Ok(Vec::new());
        }
        self.console.inventory(&inv)?;
        let take = match policy {
            EmptyPolicy::TakeAll => true,
            _ => ask_take_all(&mut *self.input, self.console.out_mut())?,
        };
        tracing::info!(target: "harvest.collector", ?policy, take, files = inv.links.len(), "empty page");
        Ok(if take { dedup_in_order(inv.links) } else { Vec::new() })
    }

    /// Fetch one file; `Ok(false)` when the download itself failed.
    async fn fetch_one(&mut self, item: &DownloadItem) -> Result<bool> {
        let fetcher = self.fetcher;
        let console = &mut self.console;
        let mut write_err: Option<io::Error> = None;
        let result = fetcher
            .fetch(&item.url, &item.dest, &mut |p: Progress| {
                if write_err.is_none() {
                    write_err = console.progress(p).err();
                }
            })
            .await;
        if let Some(err) = write_err {
            return Err(err.into());
        }
        match result {
            Ok(bytes) => {
                tracing::info!(target: "harvest.collector", file = %item.file_name, bytes, "downloaded");
                self.console.downloaded(&item.file_name)?;
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(target: "harvest.collector", url = %item.url, error = %err, "download failed");
                self.console.download_failed(&item.url, &err)?;
                Ok(false)
            }
        }
    }

    /// One target; `None` when the page yielded no matches.
    async fn process(&mut self, target: &OsTarget) -> Result<Option<Tally>> {
        let browser = self.browser;
        let cfg = self.cfg;

        let direct = self.open_drivers_page(target).await?;
        let current = browser.current_url().await?;
        self.console.note(&format!("Current URL: {current}"))?;
        if !current.contains(&cfg.site.product_fragment) {
            self.console
                .note(&format!("Failed to load drivers page, skipping {}...", target.name))?;
            return Err(FirmfetchError::Navigation(format!(
                "landed on {current}, expected {}",
                cfg.site.product_fragment
            )));
        }

        if !direct {
            self.console.note(&format!("Selecting {}...", target.name))?;
            let outcome = select_os(browser, target, &cfg.selectors, &self.pacer).await;
            if !outcome.is_selected() {
                self.console
                    .note(&format!("Failed to select {}, skipping...", target.name))?;
                return Err(FirmfetchError::Selection(format!(
                    "no option for {} on the page",
                    target.code
                )));
            }
        }

        let label = self.package_label();
        self.console
            .note(&format!("Searching for {label} files for {}...", target.name))?;
        let scan = scan_links(browser, &cfg.scan, &cfg.selectors).await?;
        for mention in &scan.text_mentions {
            self.console.note(&format!("Element text: {mention}..."))?;
        }
        self.console.note(&format!(
            "Found {} {label} files for {}",
            scan.links.len(),
            target.name
        ))?;

        let links = if scan.is_empty() {
            self.links_for_empty_page().await?
        } else {
            scan.links
        };
        if links.is_empty() {
            self.console
                .note(&format!("No {label} files found for {}", target.name))?;
            return Ok(None);
        }

        let dir = target_dir(&cfg.download, &target.name);
        std::fs::create_dir_all(&dir).map_err(|e| {
            FirmfetchError::Download(format!("cannot create {}: {e}", dir.display()))
        })?;

        let page_url = browser.current_url().await.unwrap_or(current);
        let plan = plan_downloads(&links, &page_url, &dir, self.fallback_ext());
        let fetches: Vec<&DownloadItem> = plan
            .iter()
            .filter_map(|e| match e {
                PlanEntry::Fetch(item) => Some(item),
                PlanEntry::Script(_) => None,
            })
            .collect();
        self.console
            .samples(&target.name, &fetches, cfg.scan.sample_size)?;
        self.console.download_dir(&dir)?;

        let total = plan.len();
        let mut tally = Tally {
            found: total,
            downloaded: 0,
        };
        for (idx, entry) in plan.iter().enumerate() {
            match entry {
                PlanEntry::Script(url) => {
                    self.console.script_link(url)?;
                }
                PlanEntry::Fetch(item) if cfg.download.skip_existing && item.dest.exists() => {
                    self.console.exists(&item.file_name)?;
                    tally.downloaded += 1;
                }
                PlanEntry::Fetch(item) => {
                    self.console.downloading(idx + 1, total, &item.file_name)?;
                    if self.fetch_one(item).await? {
                        tally.downloaded += 1;
                    }
                }
            }
        }

        self.console.completed(&target.name, tally)?;
        Ok(Some(tally))
    }
}
