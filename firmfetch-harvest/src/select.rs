//! Driving the OS filter on the drivers page.
//!
//! The page offers no stable API: we open the listbox if one is visible, then
//! try the configured option templates for the target code and its fallbacks
//! until a click sticks.

use crate::catalog::OsTarget;
use firmfetch_config::SelectorConfig;
use firmfetch_drivers::browser::{
    click_with_fallback, first_displayed,
    pacing::{Pacer, Pause},
    probe::{option_chain, Probe},
    Browser, PageElement,
};
use std::iter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// `code` is the option that was clicked; differs from the target code
    /// when a fallback was used.
    Selected { code: String },
    NotFound,
}

impl SelectOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectOutcome::Selected { .. })
    }
}

/// True when the page reflects `code`: the URL names it, or the lower-cased
/// source mentions `keyword`.
pub fn page_reflects(url: &str, source: &str, code: &str, keyword: &str) -> bool {
    url.contains(code) || source_mentions(source, keyword)
}

/// Case-insensitive keyword search over page source.
pub fn source_mentions(source: &str, keyword: &str) -> bool {
    !keyword.is_empty() && source.to_lowercase().contains(&keyword.to_lowercase())
}

/// Try to filter the listing by `target`'s OS.
///
/// Without a `verify` keyword the first successful click is accepted. With
/// one, a click only counts when [`page_reflects`] afterwards; otherwise the
/// next candidate element is tried.
pub async fn select_os<B: Browser>(
    browser: &B,
    target: &OsTarget,
    selectors: &SelectorConfig,
    pacer: &Pacer,
) -> SelectOutcome {
    tracing::info!(target: "harvest.select", code = %target.code, name = %target.name, "selecting OS");
    pacer.pause(Pause::PreSelect).await;

    if let Some(dropdown) = first_displayed(browser, &Probe::css(selectors.dropdown.as_str())).await {
        match dropdown.click().await {
            Ok(()) => pacer.pause(Pause::DropdownOpen).await,
            Err(err) => {
                tracing::debug!(target: "harvest.select", error = %err, "dropdown click failed")
            }
        }
    }

    for code in iter::once(&target.code).chain(target.fallbacks.iter()) {
        if code != &target.code {
            tracing::info!(target: "harvest.select", fallback = %code, "trying fallback option");
        }
        for probe in option_chain(&selectors.option_templates, code) {
            let elements = match browser.find_all(&probe).await {
                Ok(elements) => elements,
                Err(err) => {
                    tracing::debug!(target: "harvest.select", %probe, error = %err, "lookup failed");
                    continue;
                }
            };
            tracing::debug!(target: "harvest.select", %probe, found = elements.len(), "option candidates");

            for el in elements {
                let usable = el.is_displayed().await.unwrap_or(false)
                    || el.is_enabled().await.unwrap_or(false);
                if !usable {
                    continue;
                }
                if let Err(err) = el.scroll_into_view().await {
                    tracing::debug!(target: "harvest.select", error = %err, "scroll failed");
                }
                pacer.pause(Pause::ScrollSettle).await;

                match click_with_fallback(&el).await {
                    Ok(method) => {
                        tracing::debug!(target: "harvest.select", %probe, ?method, "option clicked")
                    }
                    Err(err) => {
                        tracing::warn!(target: "harvest.select", %probe, error = %err, "option click failed");
                        continue;
                    }
                }
                pacer.pause(Pause::Reload).await;

                let Some(keyword) = target.verify.as_deref() else {
                    return SelectOutcome::Selected { code: code.clone() };
                };
                let url = browser.current_url().await.unwrap_or_default();
                let source = browser.source().await.unwrap_or_default();
                if page_reflects(&url, &source, code, keyword) {
                    return SelectOutcome::Selected { code: code.clone() };
                }
                tracing::info!(
                    target: "harvest.select",
                    %probe,
                    "click did not change the page; trying next candidate"
                );
            }
        }
    }

    tracing::warn!(target: "harvest.select", code = %target.code, "no OS option could be selected");
    SelectOutcome::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_code_counts_as_reflected() {
        assert!(page_reflects("https://x.test/drivers?os=US008", "", "US008", "ubuntu"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert!(page_reflects("https://x.test/drivers", "<td>Ubuntu Server</td>", "US008", "ubuntu"));
        assert!(!page_reflects("https://x.test/drivers", "<td>RHEL</td>", "US008", "ubuntu"));
    }

    #[test]
    fn empty_keyword_never_matches() {
        assert!(!source_mentions("anything", ""));
    }
}
