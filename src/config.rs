use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Review containers used by common review widgets, most specific first.
pub const DEFAULT_SELECTORS: [&str; 10] = [
    ".jdgm-rev__body p",
    ".text.show-more__control",
    ".review-text",
    ".review-content",
    "div.comment-body",
    ".review-body",
    ".ugc-review",
    ".comment",
    "article",
    "blockquote",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub selectors: Vec<String>,
    pub max_reviews: usize,
    pub wait_timeout_secs: u64,
    pub scroll_pause_secs: u64,
    pub max_stale_rounds: u32,
    pub user_agent: String,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub chrome_path: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            max_reviews: 1000,
            wait_timeout_secs: 20,
            scroll_pause_secs: 5,
            max_stale_rounds: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
            window_size: (1920, 1080),
            chrome_path: None,
        }
    }
}

impl ScraperConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_secs(self.scroll_pause_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub model_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            model_dir: PathBuf::from("model"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file; fields it leaves out keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                let raw = fs::read_to_string(path)?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let scraper = &self.scraper;
        if scraper.selectors.is_empty() {
            return Err(Error::Config("at least one selector is required".into()));
        }
        for selector in &scraper.selectors {
            Selector::parse(selector).map_err(|e| Error::InvalidSelector {
                selector: selector.clone(),
                reason: e.to_string(),
            })?;
        }
        if scraper.max_reviews == 0 {
            return Err(Error::Config("max_reviews must be greater than zero".into()));
        }
        if scraper.max_stale_rounds == 0 {
            return Err(Error::Config("max_stale_rounds must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.scraper.selectors.len(), 10);
        assert_eq!(config.scraper.selectors[0], ".jdgm-rev__body p");
        assert_eq!(config.scraper.max_reviews, 1000);
        assert_eq!(config.scraper.wait_timeout(), Duration::from_secs(20));
        assert_eq!(config.scraper.scroll_pause(), Duration::from_secs(5));
        assert_eq!(config.scraper.max_stale_rounds, 3);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scraper": {{"max_reviews": 50}}, "model_dir": "models/xgb"}}"#).unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.scraper.max_reviews, 50);
        assert_eq!(config.scraper.scroll_pause_secs, 5);
        assert_eq!(config.model_dir, PathBuf::from("models/xgb"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn rejects_broken_selector() {
        let mut config = AppConfig::default();
        config.scraper.selectors.push("div[".into());
        assert!(matches!(config.validate(), Err(Error::InvalidSelector { .. })));
    }

    #[test]
    fn rejects_zero_limits() {
        let mut config = AppConfig::default();
        config.scraper.max_reviews = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.scraper.selectors.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
