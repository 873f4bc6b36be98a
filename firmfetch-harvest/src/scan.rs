//! Link discovery on the rendered drivers page.
//!
//! Anchors are always inspected. With `scan.deep` enabled, and only while
//! nothing has been found yet, the scan escalates through page-source regexes,
//! download buttons, text mentions (diagnostic only), and data attributes.

use anyhow::Result;
use firmfetch_config::{ScanConfig, SelectorConfig};
use firmfetch_drivers::browser::{probe::Probe, Browser, PageElement};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

const MAX_LOGGED_REFS: usize = 10;
const MAX_TEXT_MENTIONS: usize = 5;

/// Result of scanning one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkScan {
    /// Candidate package URLs, de-duplicated in first-seen order.
    pub links: Vec<String>,
    /// Bare file names referenced in page source (deep scan only).
    pub filename_refs: Vec<String>,
    /// Text of elements mentioning a package extension (deep scan only).
    pub text_mentions: Vec<String>,
}

impl LinkScan {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Every download-looking anchor on the page, used when no package matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub links: Vec<String>,
    /// Extension (lower-case, no dot) -> number of links.
    pub by_extension: BTreeMap<String, usize>,
}

/// True when `href` ends with `.<ext>` for any configured extension.
///
/// ```
/// use firmfetch_harvest::scan::has_extension;
///
/// let exts = vec!["bin".to_string()];
/// assert!(has_extension("https://dl.test/BIOS_X.BIN", &exts));
/// assert!(!has_extension("https://dl.test/BIOS_X.BIN.sign", &exts));
/// ```
pub fn has_extension(href: &str, exts: &[String]) -> bool {
    let lower = href.to_lowercase();
    exts.iter()
        .filter(|e| !e.trim().is_empty())
        .any(|e| lower.ends_with(&format!(".{}", e.trim().to_lowercase())))
}

/// True when `value` contains `.<ext>` anywhere (attribute values, scripts).
pub fn mentions_extension(value: &str, exts: &[String]) -> bool {
    let lower = value.to_lowercase();
    exts.iter()
        .filter(|e| !e.trim().is_empty())
        .any(|e| lower.contains(&format!(".{}", e.trim().to_lowercase())))
}

fn ext_alternation(exts: &[String]) -> String {
    exts.iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

/// Absolute `http(s)` URLs in raw page source that end in a package extension.
///
/// ```
/// use firmfetch_harvest::scan::absolute_urls_in_source;
///
/// let html = r#"<script>var u = "https://dl.dell.com/FOLDER1/fw.BIN";</script>"#;
/// let urls = absolute_urls_in_source(html, &["bin".to_string()]);
/// assert_eq!(urls, vec!["https://dl.dell.com/FOLDER1/fw.BIN".to_string()]);
/// ```
pub fn absolute_urls_in_source(source: &str, exts: &[String]) -> Vec<String> {
    let alt = ext_alternation(exts);
    if alt.is_empty() {
        return Vec::new();
    }
    let Ok(re) = Regex::new(&format!(r#"(?i)https?://[^\s"'<>]+\.(?:{alt})\b"#)) else {
        return Vec::new();
    };
    re.find_iter(source).map(|m| m.as_str().to_string()).collect()
}

/// Bare file names such as `BIOS_0GHF8_LN64_2.19.1.BIN` referenced in source.
pub fn filename_refs_in_source(source: &str, exts: &[String]) -> Vec<String> {
    let alt = ext_alternation(exts);
    if alt.is_empty() {
        return Vec::new();
    }
    let Ok(re) = Regex::new(&format!(r"(?i)[A-Za-z0-9_.-]+\.(?:{alt})\b")) else {
        return Vec::new();
    };
    re.find_iter(source).map(|m| m.as_str().to_string()).collect()
}

/// Drop repeats while keeping the first occurrence of each link.
pub fn dedup_in_order(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect()
}

/// XPath matching elements whose own text mentions a package extension.
fn text_mention_xpath(exts: &[String]) -> String {
    let clauses: Vec<String> = exts
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .flat_map(|e| {
            [
                format!("contains(text(), '.{}')", e.to_lowercase()),
                format!("contains(text(), '.{}')", e.to_uppercase()),
            ]
        })
        .collect();
    format!("//*[{}]", clauses.join(" or "))
}

async fn anchor_hrefs<B: Browser>(browser: &B) -> Result<Vec<String>> {
    let mut hrefs = Vec::new();
    for a in browser.find_all(&Probe::css("a")).await? {
        if let Ok(Some(href)) = a.attr("href").await {
            hrefs.push(href);
        }
    }
    Ok(hrefs)
}

async fn attribute_hits<B: Browser>(
    browser: &B,
    probe: &Probe,
    attributes: &[String],
    exts: &[String],
) -> Result<Vec<String>> {
    let mut hits = Vec::new();
    for el in browser.find_all(probe).await? {
        for attr in attributes {
            if let Ok(Some(value)) = el.attr(attr).await {
                if mentions_extension(&value, exts) {
                    hits.push(value);
                }
            }
        }
    }
    Ok(hits)
}

/// Scan the current page for package links.
pub async fn scan_links<B: Browser>(
    browser: &B,
    scan: &ScanConfig,
    selectors: &SelectorConfig,
) -> Result<LinkScan> {
    let exts = &scan.extensions;
    let mut out = LinkScan::default();

    let mut links: Vec<String> = anchor_hrefs(browser)
        .await?
        .into_iter()
        .filter(|href| has_extension(href, exts))
        .collect();
    tracing::info!(target: "harvest.scan", method = "anchors", found = links.len(), "scan step");

    if scan.deep && links.is_empty() {
        let source = browser.source().await?;
        links.extend(absolute_urls_in_source(&source, exts));
        out.filename_refs = filename_refs_in_source(&source, exts);
        for name in out.filename_refs.iter().take(MAX_LOGGED_REFS) {
            tracing::debug!(target: "harvest.scan", %name, "file name referenced in source");
        }
        tracing::info!(
            target: "harvest.scan",
            method = "source",
            found = links.len(),
            refs = out.filename_refs.len(),
            "scan step"
        );
    }

    if scan.deep && links.is_empty() {
        let probe = Probe::xpath(selectors.download_buttons.as_str());
        match attribute_hits(browser, &probe, &selectors.button_attributes, exts).await {
            Ok(hits) => links.extend(hits),
            Err(err) => tracing::debug!(target: "harvest.scan", error = %err, "button lookup failed"),
        }
        tracing::info!(target: "harvest.scan", method = "buttons", found = links.len(), "scan step");
    }

    if scan.deep && links.is_empty() {
        let probe = Probe::xpath(text_mention_xpath(exts));
        if let Ok(elements) = browser.find_all(&probe).await {
            tracing::info!(target: "harvest.scan", method = "text", elements = elements.len(), "scan step");
            for el in elements.iter().take(MAX_TEXT_MENTIONS) {
                if let Ok(text) = el.text().await {
                    out.text_mentions.push(text.chars().take(100).collect());
                }
            }
        }
    }

    if scan.deep && links.is_empty() {
        let probe = Probe::css(selectors.data_rows.as_str());
        match attribute_hits(browser, &probe, &selectors.data_row_attributes, exts).await {
            Ok(hits) => links.extend(hits),
            Err(err) => tracing::debug!(target: "harvest.scan", error = %err, "data row lookup failed"),
        }
        tracing::info!(target: "harvest.scan", method = "data-attributes", found = links.len(), "scan step");
    }

    out.links = dedup_in_order(links);
    Ok(out)
}

/// Collect every anchor whose href mentions one of the inventory extensions.
pub async fn inventory<B: Browser>(browser: &B, scan: &ScanConfig) -> Result<Inventory> {
    let mut inv = Inventory::default();
    for href in anchor_hrefs(browser).await? {
        if !mentions_extension(&href, &scan.inventory_extensions) {
            continue;
        }
        let ext = href.rsplit('.').next().unwrap_or_default().to_lowercase();
        *inv.by_extension.entry(ext).or_insert(0) += 1;
        inv.links.push(href);
    }
    Ok(inv)
}
