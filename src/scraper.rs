use std::collections::HashSet;
use std::thread;

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserPage;
use crate::config::ScraperConfig;
use crate::error::{Error, Result};
use crate::utils::normalize_whitespace;

/// A loaded page that review text can be pulled from.
pub trait ReviewPage {
    /// Text of every element matching `selector`, after waiting for at least
    /// one to appear. An error or an empty list both mean "not on this page".
    fn texts(&mut self, selector: &str) -> Result<Vec<String>>;

    /// Scrolls to the bottom of the document. Returns `false` when scrolling
    /// cannot reveal anything new.
    fn scroll_to_bottom(&mut self) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    Exhausted,
    NoSelectorMatched,
    PageError(String),
}

#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub reviews: Vec<String>,
    pub stop: StopReason,
}

/// Checks user input before anything is launched.
pub fn parse_url(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::MissingUrl);
    }
    let url = Url::parse(input).map_err(|e| Error::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme `{}`", other),
        }),
    }
}

/// Scrapes reviews from `url` with a headless browser.
pub fn scrape_reviews(url: &Url, config: &ScraperConfig) -> Result<ScrapeOutcome> {
    let mut page = BrowserPage::open(url, config)?;
    Ok(collect_reviews(&mut page, config))
}

/// Scrapes reviews from the server-rendered HTML only, no JavaScript.
pub fn fetch_static(url: &Url, config: &ScraperConfig) -> Result<ScrapeOutcome> {
    let mut page = HtmlSnapshot::fetch(url, config)?;
    Ok(collect_reviews(&mut page, config))
}

/// Repeatedly scrapes with the first selector that matches and scrolls
/// until the review count stops growing, the limit is hit, or the page fails.
pub fn collect_reviews<P: ReviewPage>(page: &mut P, config: &ScraperConfig) -> ScrapeOutcome {
    let mut reviews: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut last_count = 0;
    let mut stale_rounds = 0;

    let stop = loop {
        if reviews.len() >= config.max_reviews {
            break StopReason::LimitReached;
        }

        let mut found = false;
        for selector in &config.selectors {
            let texts = match page.texts(selector) {
                Ok(texts) if !texts.is_empty() => texts,
                Ok(_) => continue,
                Err(e) => {
                    debug!(selector = %selector, error = %e, "selector not found");
                    continue;
                }
            };

            for text in texts {
                let text = text.trim();
                if !text.is_empty() && seen.insert(text.to_string()) {
                    reviews.push(text.to_string());
                    if reviews.len() >= config.max_reviews {
                        break;
                    }
                }
            }
            debug!(selector = %selector, total = reviews.len(), "collected reviews");
            found = true;
            break;
        }

        if !found {
            break StopReason::NoSelectorMatched;
        }

        if reviews.len() == last_count {
            stale_rounds += 1;
        } else {
            stale_rounds = 0;
        }
        last_count = reviews.len();

        if stale_rounds >= config.max_stale_rounds {
            break StopReason::Exhausted;
        }
        if reviews.len() >= config.max_reviews {
            continue;
        }

        match page.scroll_to_bottom() {
            Ok(true) => thread::sleep(config.scroll_pause()),
            Ok(false) => break StopReason::Exhausted,
            Err(e) => {
                warn!(error = %e, "page failed while scrolling, keeping collected reviews");
                break StopReason::PageError(e.to_string());
            }
        }
    };

    info!(count = reviews.len(), stop = ?stop, "scraping finished");
    ScrapeOutcome { reviews, stop }
}

/// A fixed HTML document, either fetched over HTTP or handed in directly.
pub struct HtmlSnapshot {
    document: Html,
}

impl HtmlSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    pub fn fetch(url: &Url, config: &ScraperConfig) -> Result<Self> {
        info!(url = %url, "fetching page");
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.wait_timeout())
            .build()?;
        let body = client.get(url.as_str()).send()?.error_for_status()?.text()?;
        Ok(Self::parse(&body))
    }
}

impl ReviewPage for HtmlSnapshot {
    fn texts(&mut self, selector: &str) -> Result<Vec<String>> {
        let parsed = Selector::parse(selector).map_err(|e| Error::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self
            .document
            .select(&parsed)
            .map(|element| normalize_whitespace(&element.text().collect::<String>()))
            .collect())
    }

    fn scroll_to_bottom(&mut self) -> Result<bool> {
        Ok(false)
    }
}
