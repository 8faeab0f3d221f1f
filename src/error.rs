use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please enter a URL.")]
    MissingUrl,

    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    // headless_chrome reports everything as anyhow::Error
    #[error("Browser error: {0:#}")]
    Browser(anyhow::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Classifier returned unknown label index {0}")]
    UnknownLabel(usize),

    #[error("Invalid CSS selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Got {reviews} reviews but {emotions} emotions")]
    LengthMismatch { reviews: usize, emotions: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
