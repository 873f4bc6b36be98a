//! Browser seam: the page and element operations the harvest loop relies on.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub mod driver;
pub mod options;
pub mod pacing;
pub mod probe;

use probe::Probe;

/// A DOM element handle on the current page.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Read an attribute (or property, per WebDriver semantics).
    async fn attr(&self, name: &str) -> Result<Option<String>>;

    /// Visible text of the element.
    async fn text(&self) -> Result<String>;

    async fn is_displayed(&self) -> Result<bool>;

    async fn is_enabled(&self) -> Result<bool>;

    /// Native WebDriver click.
    async fn click(&self) -> Result<()>;

    /// Click dispatched from page script; works on covered or off-screen elements.
    async fn js_click(&self) -> Result<()>;

    async fn scroll_into_view(&self) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    async fn type_text(&self, text: &str) -> Result<()>;

    async fn press_enter(&self) -> Result<()>;
}

/// A single browser tab driven by the harvest loop.
#[async_trait]
pub trait Browser: Send + Sync {
    type Element: PageElement;

    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Full HTML source of the rendered page.
    async fn source(&self) -> Result<String>;

    /// All elements matching `probe`; an empty list is not an error.
    async fn find_all(&self, probe: &Probe) -> Result<Vec<Self::Element>>;

    /// Wait up to `timeout` for an element matching `probe` to appear.
    async fn wait_for(&self, probe: &Probe, timeout: Duration) -> Result<Self::Element>;

    /// End the browser session.
    async fn close(&self) -> Result<()>;
}

/// How a click was finally delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMethod {
    Native,
    Script,
}

/// Click natively and fall back to a script click when WebDriver refuses.
pub async fn click_with_fallback<E: PageElement>(element: &E) -> Result<ClickMethod> {
    match element.click().await {
        Ok(()) => Ok(ClickMethod::Native),
        Err(err) => {
            tracing::debug!(
                target: "browser.click",
                error = %err,
                "native click failed; retrying via script"
            );
            element.js_click().await?;
            Ok(ClickMethod::Script)
        }
    }
}

/// Try each probe in order, waiting up to `timeout` for each.
///
/// Returns the first element found together with the index of the probe
/// that located it.
pub async fn first_match<B: Browser>(
    browser: &B,
    chain: &[Probe],
    timeout: Duration,
) -> Option<(B::Element, usize)> {
    for (idx, probe) in chain.iter().enumerate() {
        match browser.wait_for(probe, timeout).await {
            Ok(el) => {
                tracing::info!(target: "browser.selector", %probe, "probe matched");
                return Some((el, idx));
            }
            Err(err) => {
                tracing::debug!(target: "browser.selector", %probe, error = %err, "probe missed");
            }
        }
    }
    None
}

/// First element matching `probe` that reports itself as displayed.
///
/// Lookup and visibility errors are treated as "not displayed".
pub async fn first_displayed<B: Browser>(browser: &B, probe: &Probe) -> Option<B::Element> {
    let elements = browser.find_all(probe).await.ok()?;
    for el in elements {
        if el.is_displayed().await.unwrap_or(false) {
            return Some(el);
        }
    }
    None
}
