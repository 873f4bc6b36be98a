use crate::browser::{options::chrome_arguments, probe::Probe, Browser, PageElement};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{elements::Element, Client, ClientBuilder};
use firmfetch_config::BrowserConfig;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

/// WebDriver key code for Enter.
const KEY_ENTER: &str = "\u{e007}";

/// Thin wrapper around a `fantoccini` WebDriver client.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Open a Chrome session through the WebDriver service at
    /// `cfg.webdriver_url` (chromedriver on `http://localhost:9515` by default).
    pub async fn connect(cfg: &BrowserConfig) -> Result<Self> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(chrome_arguments(cfg)));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&cfg.webdriver_url)
            .await
            .with_context(|| format!("failed to start WebDriver session at {}", cfg.webdriver_url))?;

        tracing::info!(
            target: "browser.session",
            endpoint = %cfg.webdriver_url,
            headless = cfg.headless,
            "browser session started"
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<()> {
        self.client.goto(url).await.map_err(anyhow::Error::from)
    }

    async fn current_url(&self) -> Result<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(anyhow::Error::from)
    }

    async fn source(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    async fn find_all(&self, probe: &Probe) -> Result<Vec<WebElement>> {
        let elements = self.client.find_all(probe.locator()).await?;
        Ok(elements
            .into_iter()
            .map(|element| WebElement::new(element, &self.client))
            .collect())
    }

    async fn wait_for(&self, probe: &Probe, timeout: Duration) -> Result<WebElement> {
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(probe.locator())
            .await?;
        Ok(WebElement::new(element, &self.client))
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().close().await?;
        tracing::info!(target: "browser.session", "browser session closed");
        Ok(())
    }
}

#[derive(Clone)]
/// DOM element bound to the client that produced it, so script calls can
/// pass the element back into the page.
pub struct WebElement {
    element: Element,
    client: Client,
}

impl WebElement {
    fn new(element: Element, client: &Client) -> Self {
        Self {
            element,
            client: client.clone(),
        }
    }

    async fn run_script_on(&self, script: &str) -> Result<()> {
        let arg = serde_json::to_value(&self.element)?;
        self.client.execute(script, vec![arg]).await?;
        Ok(())
    }
}

#[async_trait]
impl PageElement for WebElement {
    async fn attr(&self, name: &str) -> Result<Option<String>> {
        self.element.attr(name).await.map_err(anyhow::Error::from)
    }

    async fn text(&self) -> Result<String> {
        self.element.text().await.map_err(anyhow::Error::from)
    }

    async fn is_displayed(&self) -> Result<bool> {
        self.element.is_displayed().await.map_err(anyhow::Error::from)
    }

    async fn is_enabled(&self) -> Result<bool> {
        self.element.is_enabled().await.map_err(anyhow::Error::from)
    }

    async fn click(&self) -> Result<()> {
        self.element.click().await.map_err(anyhow::Error::from)
    }

    async fn js_click(&self) -> Result<()> {
        self.run_script_on("arguments[0].click();").await
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.run_script_on("arguments[0].scrollIntoView(true);").await
    }

    async fn clear(&self) -> Result<()> {
        self.element.clear().await.map_err(anyhow::Error::from)
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.element.send_keys(text).await.map_err(anyhow::Error::from)
    }

    async fn press_enter(&self) -> Result<()> {
        self.element
            .send_keys(KEY_ENTER)
            .await
            .map_err(anyhow::Error::from)
    }
}
