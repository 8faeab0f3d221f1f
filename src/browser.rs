use std::sync::Arc;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Error, Result};
use crate::scraper::ReviewPage;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// A review page loaded in headless Chrome. Chrome is shut down on drop.
pub struct BrowserPage {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl BrowserPage {
    pub fn open(url: &Url, config: &ScraperConfig) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .path(config.chrome_path.clone())
            .build()
            .map_err(|e| Error::Browser(anyhow::anyhow!(e.to_string())))?;

        info!(url = %url, headless = config.headless, "launching browser");
        let browser = Browser::new(options).map_err(Error::Browser)?;
        let tab = browser.new_tab().map_err(Error::Browser)?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(Error::Browser)?;
        tab.set_default_timeout(config.wait_timeout());
        tab.navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(Error::Browser)?;

        Ok(Self {
            tab,
            _browser: browser,
        })
    }
}

impl ReviewPage for BrowserPage {
    fn texts(&mut self, selector: &str) -> Result<Vec<String>> {
        let elements = self.tab.wait_for_elements(selector).map_err(Error::Browser)?;
        debug!(selector = %selector, count = elements.len(), "elements present");
        elements
            .iter()
            .map(|element| element.get_inner_text().map_err(Error::Browser))
            .collect()
    }

    fn scroll_to_bottom(&mut self) -> Result<bool> {
        self.tab
            .evaluate(SCROLL_TO_BOTTOM, false)
            .map_err(Error::Browser)?;
        Ok(true)
    }
}
