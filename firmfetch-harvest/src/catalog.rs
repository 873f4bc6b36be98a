//! OS targets visited by a run.

use firmfetch_common::{FirmfetchError, Result};
use std::fmt::Write as _;

pub use firmfetch_config::TargetSpec as OsTarget;

/// Narrow `all` to the codes in `only`, keeping catalog order.
///
/// An empty `only` keeps every target. Codes compare case-insensitively;
/// an unknown code is a configuration error.
///
/// ```
/// use firmfetch_config::default_targets;
/// use firmfetch_harvest::catalog::select_targets;
///
/// let picked = select_targets(&default_targets(), &["xi80".into(), "BIOSA".into()]).unwrap();
/// let codes: Vec<_> = picked.iter().map(|t| t.code.as_str()).collect();
/// assert_eq!(codes, ["BIOSA", "XI80"]);
/// ```
pub fn select_targets(all: &[OsTarget], only: &[String]) -> Result<Vec<OsTarget>> {
    if only.is_empty() {
        return Ok(all.to_vec());
    }
    if let Some(unknown) = only
        .iter()
        .find(|code| !all.iter().any(|t| t.code.eq_ignore_ascii_case(code)))
    {
        return Err(FirmfetchError::Config(format!("unknown OS code: {unknown}")));
    }
    Ok(all
        .iter()
        .filter(|t| only.iter().any(|code| t.code.eq_ignore_ascii_case(code)))
        .cloned()
        .collect())
}

/// Two-column listing of the catalog, one target per line.
pub fn render_catalog(targets: &[OsTarget]) -> String {
    let width = targets.iter().map(|t| t.code.len()).max().unwrap_or(0);
    let mut out = String::new();
    for t in targets {
        let _ = write!(out, "{:<width$}  {}", t.code, t.name);
        if !t.fallbacks.is_empty() {
            let _ = write!(out, "  (fallbacks: {})", t.fallbacks.join(", "));
        }
        out.push('\n');
    }
    out
}
