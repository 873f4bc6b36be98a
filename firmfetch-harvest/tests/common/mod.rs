#![allow(dead_code)]

//! In-memory browser and fetcher for exercising the harvest loop.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use firmfetch_common::observability::{init_logging, LogConfig};
use firmfetch_config::{FirmfetchConfig, TargetSpec, TimingConfig};
use firmfetch_drivers::browser::{probe::Probe, Browser, PageElement};
use firmfetch_http::{Fetcher, HttpError, Progress, StatusCode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Route harvest events into a scratch log so failures can be traced.
pub fn init_test_tracing() {
    let _ = LOG_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "firmfetch-tests",
            log_dir: Some(std::env::temp_dir().join("firmfetch-tests")),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };
        init_logging(config).unwrap_or_default()
    });
}

pub const DRIVERS_URL: &str = "https://www.dell.test/support/product/poweredge-r440/drivers";
pub const DROPDOWN: &str = "button[aria-haspopup='listbox']";

pub fn option_selector(code: &str) -> String {
    format!("button[data-value='{code}']")
}

pub fn filtered_url(code: &str) -> String {
    format!("{DRIVERS_URL}#{code}")
}

/// Config pointing at the fake site, saving under `dir`, with no delays.
pub fn test_config(dir: &Path, targets: Vec<TargetSpec>) -> FirmfetchConfig {
    let mut cfg = FirmfetchConfig::default();
    cfg.site.drivers_url = DRIVERS_URL.to_string();
    cfg.download.dir = dir.to_string_lossy().into_owned();
    cfg.timing = TimingConfig::zero();
    cfg.targets = targets;
    cfg
}

#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub displayed: bool,
    pub enabled: bool,
    pub navigates_to: Option<String>,
    pub click_fails: bool,
}

impl ElementSpec {
    pub fn visible() -> Self {
        Self {
            displayed: true,
            enabled: true,
            ..Self::default()
        }
    }

    pub fn anchor(href: &str) -> Self {
        Self::visible().attr("href", href)
    }

    pub fn option_to(url: &str) -> Self {
        Self {
            navigates_to: Some(url.to_string()),
            ..Self::visible()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self.enabled = false;
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub source: String,
    pub elements: HashMap<String, Vec<ElementSpec>>,
}

impl Page {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, selector: &str, el: ElementSpec) -> Self {
        self.elements.entry(selector.to_string()).or_default().push(el);
        self
    }

    /// Base drivers page offering each code in the OS listbox.
    pub fn drivers_with_options(codes: &[&str]) -> Self {
        let mut page = Page::new("<html>drivers</html>").with(DROPDOWN, ElementSpec::visible());
        for code in codes {
            page = page.with(&option_selector(code), ElementSpec::option_to(&filtered_url(code)));
        }
        page
    }

    pub fn with_anchors(mut self, hrefs: &[&str]) -> Self {
        for href in hrefs {
            self = self.with("a", ElementSpec::anchor(href));
        }
        self
    }
}

#[derive(Debug, Default)]
struct State {
    current_url: String,
    pages: HashMap<String, Page>,
    visited: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<String>,
    closed: bool,
}

impl State {
    fn page(&self) -> Option<&Page> {
        self.pages.get(&self.current_url)
    }
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<State>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, page: Page) -> Self {
        self.state.lock().unwrap().pages.insert(url.to_string(), page);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

pub struct FakeElement {
    spec: ElementSpec,
    label: String,
    state: Arc<Mutex<State>>,
}

impl FakeElement {
    fn activate(&self, how: &str) {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(format!("{how}:{}", self.label));
        if let Some(url) = &self.spec.navigates_to {
            state.current_url = url.clone();
        }
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn attr(&self, name: &str) -> Result<Option<String>> {
        Ok(self.spec.attrs.get(name).cloned())
    }

    async fn text(&self) -> Result<String> {
        Ok(self.spec.text.clone())
    }

    async fn is_displayed(&self) -> Result<bool> {
        Ok(self.spec.displayed)
    }

    async fn is_enabled(&self) -> Result<bool> {
        Ok(self.spec.enabled)
    }

    async fn click(&self) -> Result<()> {
        if self.spec.click_fails {
            return Err(anyhow!("element click intercepted"));
        }
        self.activate("native");
        Ok(())
    }

    async fn js_click(&self) -> Result<()> {
        self.activate("script");
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    async fn press_enter(&self) -> Result<()> {
        self.activate("enter");
        Ok(())
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.visited.push(url.to_string());
        state.current_url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn source(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state.page().map(|p| p.source.clone()).unwrap_or_default())
    }

    async fn find_all(&self, probe: &Probe) -> Result<Vec<FakeElement>> {
        let state = self.state.lock().unwrap();
        let specs = state
            .page()
            .and_then(|p| p.elements.get(probe.value()))
            .cloned()
            .unwrap_or_default();
        Ok(specs
            .into_iter()
            .map(|spec| FakeElement {
                spec,
                label: probe.value().to_string(),
                state: Arc::clone(&self.state),
            })
            .collect())
    }

    async fn wait_for(&self, probe: &Probe, _timeout: std::time::Duration) -> Result<FakeElement> {
        self.find_all(probe)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no element for {probe}"))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Writes a fixed body for every URL; URLs containing `broken` fail with 404.
#[derive(Default)]
pub struct FakeFetcher {
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub const BODY: &'static [u8] = b"firmware";

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<u64, HttpError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if url.contains("broken") {
            return Err(HttpError::Api {
                status: StatusCode::NOT_FOUND,
                message: "not found".into(),
            });
        }
        std::fs::write(dest, Self::BODY)?;
        let total = Self::BODY.len() as u64;
        progress(Progress {
            downloaded: total,
            total: Some(total),
        });
        Ok(total)
    }
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default();
    files.sort();
    files
}

/// Console sink that refuses writes containing `fail_on`; `None` refuses all.
pub struct FlakyOut {
    pub buf: Vec<u8>,
    fail_on: Option<&'static str>,
}

impl FlakyOut {
    pub fn failing_on(marker: &'static str) -> Self {
        Self {
            buf: Vec::new(),
            fail_on: Some(marker),
        }
    }

    pub fn broken() -> Self {
        Self {
            buf: Vec::new(),
            fail_on: None,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

impl std::io::Write for FlakyOut {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let refuse = match self.fail_on {
            None => true,
            Some(marker) => String::from_utf8_lossy(data).contains(marker),
        };
        if refuse {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "console gone"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
