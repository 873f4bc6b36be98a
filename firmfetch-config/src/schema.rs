//! Strongly typed configuration schema with built-in defaults.
//!
//! Every section is `#[serde(default)]`, so an empty document yields the
//! PowerEdge R440 collection run that needs no configuration at all.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirmfetchConfig {
    pub version: Option<String>,
    pub browser: BrowserConfig,
    pub site: SiteConfig,
    pub selectors: SelectorConfig,
    pub scan: ScanConfig,
    pub download: DownloadConfig,
    pub timing: TimingConfig,
    pub on_empty: EmptyPolicy,
    pub targets: Vec<TargetSpec>,
    pub logging: LoggingConfig,
}

impl Default for FirmfetchConfig {
    fn default() -> Self {
        Self {
            version: None,
            browser: BrowserConfig::default(),
            site: SiteConfig::default(),
            selectors: SelectorConfig::default(),
            scan: ScanConfig::default(),
            download: DownloadConfig::default(),
            timing: TimingConfig::default(),
            on_empty: EmptyPolicy::default(),
            targets: default_targets(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver endpoint (chromedriver by default).
    pub webdriver_url: String,
    pub headless: bool,
    pub window: WindowSize,
    pub user_agent: String,
    /// Appended verbatim to the Chrome command line.
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            window: WindowSize::default(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Product drivers page loaded once per target.
    pub drivers_url: String,
    /// The landed URL must contain this, otherwise the target is skipped.
    pub product_fragment: String,
    /// When set, `<drivers_url>?<param>=<code>` is tried before the UI filter.
    pub os_query_param: Option<String>,
    /// Optional entry through the site's search box before the first target.
    pub search: Option<SearchEntry>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            drivers_url:
                "https://www.dell.com/support/home/ko-kr/product-support/product/poweredge-r440/drivers"
                    .into(),
            product_fragment: "poweredge-r440".into(),
            os_query_param: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    pub home_url: String,
    pub query: String,
}

/// How a single element probe locates its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Id,
    Css,
    Xpath,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeSpec {
    pub by: ProbeKind,
    pub value: String,
}

impl ProbeSpec {
    fn new(by: ProbeKind, value: &str) -> Self {
        Self {
            by,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// CSS for the button that opens the OS listbox.
    pub dropdown: String,
    /// CSS templates for an OS option; `{code}` is replaced by the OS code.
    pub option_templates: Vec<String>,
    /// Ordered fallbacks for the site search box.
    pub search_inputs: Vec<ProbeSpec>,
    /// XPath for download buttons and links.
    pub download_buttons: String,
    /// Attributes inspected on download buttons.
    pub button_attributes: Vec<String>,
    /// CSS for table rows/cells/containers that carry data attributes.
    pub data_rows: String,
    pub data_row_attributes: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            dropdown: "button[aria-haspopup='listbox']".into(),
            option_templates: vec![
                "button[data-value='{code}']".into(),
                "*[data-value='{code}']".into(),
            ],
            search_inputs: vec![
                ProbeSpec::new(ProbeKind::Id, "mh-search-input"),
                ProbeSpec::new(ProbeKind::Id, "inpEntry"),
                ProbeSpec::new(ProbeKind::Css, "input[placeholder*='search']"),
                ProbeSpec::new(ProbeKind::Css, "input[type='search']"),
                ProbeSpec::new(ProbeKind::Css, "input[data-testid*='search']"),
                ProbeSpec::new(ProbeKind::Css, ".search-input input"),
                ProbeSpec::new(ProbeKind::Css, "[role='searchbox']"),
                ProbeSpec::new(
                    ProbeKind::Xpath,
                    "//input[contains(@placeholder, 'Search') or contains(@placeholder, '검색')]",
                ),
            ],
            download_buttons: "//button[contains(@class, 'download') or contains(text(), '다운로드') or contains(text(), 'Download')] | \
                               //a[contains(@class, 'download') or contains(text(), '다운로드') or contains(text(), 'Download')]"
                .into(),
            button_attributes: ["href", "onclick", "data-href", "data-url", "data-download-url"]
                .map(String::from)
                .to_vec(),
            data_rows: "tr[data-href], tr[data-url], td[data-href], td[data-url], div[data-download-url]"
                .into(),
            data_row_attributes: ["data-href", "data-url", "data-download-url"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions (without the dot) that mark a binary package.
    pub extensions: Vec<String>,
    /// Enables page-source, button, and data-attribute discovery.
    pub deep: bool,
    /// Extensions counted in the inventory shown when nothing matched.
    pub inventory_extensions: Vec<String>,
    /// How many discovered files are listed before downloading.
    pub sample_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["bin".into()],
            deep: false,
            inventory_extensions: ["exe", "bin", "zip", "msi"].map(String::from).to_vec(),
            sample_size: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub dir: String,
    pub timeout_secs: u64,
    pub retries: usize,
    pub skip_existing: bool,
    /// Save into `<dir>/<OS-name>/` instead of `<dir>/`.
    pub per_os_dirs: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: "downloads".into(),
            timeout_secs: 30,
            retries: 0,
            skip_existing: true,
            per_os_dirs: true,
        }
    }
}

/// Fixed delays between browser interactions, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub page_load: u64,
    pub pre_select: u64,
    pub dropdown_open: u64,
    pub scroll_settle: u64,
    pub reload: u64,
    pub between_targets: u64,
    pub element_wait: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load: 5_000,
            pre_select: 3_000,
            dropdown_open: 2_000,
            scroll_settle: 1_000,
            reload: 7_000,
            between_targets: 3_000,
            element_wait: 5_000,
        }
    }
}

impl TimingConfig {
    /// All delays set to zero.
    pub fn zero() -> Self {
        Self {
            page_load: 0,
            pre_select: 0,
            dropdown_open: 0,
            scroll_settle: 0,
            reload: 0,
            between_targets: 0,
            element_wait: 0,
        }
    }
}

/// What to do when a page yields no matching packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPolicy {
    #[default]
    Skip,
    /// Show the inventory and ask whether to take every listed file.
    Prompt,
    /// Take every inventory file without asking.
    TakeAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetSpec {
    pub code: String,
    pub name: String,
    /// Codes tried, in order, when the primary option is not on the page.
    #[serde(default)]
    pub fallbacks: Vec<String>,
    /// Require this keyword (or the code in the URL) after selecting.
    #[serde(default)]
    pub verify: Option<String>,
}

impl TargetSpec {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            fallbacks: Vec::new(),
            verify: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<String>,
    pub stderr: bool,
    pub format: firmfetch_common::observability::LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: false,
            format: firmfetch_common::observability::LogFormat::Text,
            filter: "info".into(),
        }
    }
}

/// The PowerEdge R440 operating-system catalog, in page order.
pub fn default_targets() -> Vec<TargetSpec> {
    [
        ("BIOSA", "BIOS"),
        ("RHEL9", "Red Hat Enterprise Linux 9"),
        ("RHEL8", "Red Hat Enterprise Linux 8"),
        ("RHE70", "Red Hat Enterprise Linux 7"),
        ("RH60", "Red Hat Enterprise Linux 6"),
        ("US008", "Ubuntu Server 20.04 LTS"),
        ("US004", "Ubuntu Server 18.04 LTS"),
        ("US001", "Ubuntu Server 16.04 LTS"),
        ("SLE15", "SUSE Linux ES 15"),
        ("SLE12", "SUSE Linux ES 12"),
        ("XI80", "VMware ESXi 8.0"),
        ("XI70", "VMware ESXi 7.0"),
        ("XI67", "VMware ESXi 6.7"),
        ("XI65", "VMware ESXi 6.5"),
        ("XI60", "VMware ESXi 6.0"),
        ("CXS09", "Citrix XenServer 7.1"),
        ("WS22L", "Windows Server 2022 LTSC"),
        ("WS19L", "Windows Server 2019 LTSC"),
        ("WST14", "Windows Server 2016"),
        ("W12R2", "Windows Server 2012 R2"),
        ("NAA", "해당 없음"),
    ]
    .into_iter()
    .map(|(code, name)| TargetSpec::new(code, name))
    .collect()
}
