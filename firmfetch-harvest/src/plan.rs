//! Mapping discovered links to files on disk.

use firmfetch_common::paths::{file_name_from_url, is_script_url, safe_dir_name};
use firmfetch_config::DownloadConfig;
use std::path::{Path, PathBuf};
use url::Url;

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// Absolute URL.
    pub url: String,
    pub file_name: String,
    pub dest: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Fetch(DownloadItem),
    /// A `javascript:` pseudo-link; nothing to fetch.
    Script(String),
}

/// Directory receiving the files of one OS.
///
/// ```
/// use firmfetch_config::DownloadConfig;
/// use firmfetch_harvest::plan::target_dir;
/// use std::path::PathBuf;
///
/// let cfg = DownloadConfig::default();
/// assert_eq!(target_dir(&cfg, "Red Hat/CentOS"), PathBuf::from("downloads/Red Hat_CentOS"));
/// ```
pub fn target_dir(cfg: &DownloadConfig, os_name: &str) -> PathBuf {
    let root = Path::new(&cfg.dir);
    if cfg.per_os_dirs {
        root.join(safe_dir_name(os_name))
    } else {
        root.to_path_buf()
    }
}

/// Resolve `raw` against the page it was found on.
///
/// Absolute URLs pass through; relative ones are joined onto `base`. Returns
/// `None` when neither works.
pub fn resolve_url(raw: &str, base: Option<&Url>) -> Option<String> {
    match Url::parse(raw) {
        Ok(u) => Some(u.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|b| b.join(raw).ok()).map(|u| u.to_string())
        }
        Err(_) => None,
    }
}

/// Turn scanned links into download entries for `dir`.
///
/// File names come from the URL as found; the index used for fallback names
/// is the link's position in `links`.
pub fn plan_downloads(
    links: &[String],
    page_url: &str,
    dir: &Path,
    fallback_ext: &str,
) -> Vec<PlanEntry> {
    let base = Url::parse(page_url).ok();
    links
        .iter()
        .enumerate()
        .map(|(idx, link)| {
            if is_script_url(link) {
                return PlanEntry::Script(link.clone());
            }
            let file_name = file_name_from_url(link, idx, fallback_ext);
            let url = resolve_url(link, base.as_ref()).unwrap_or_else(|| link.clone());
            PlanEntry::Fetch(DownloadItem {
                url,
                dest: dir.join(&file_name),
                file_name,
            })
        })
        .collect()
}
