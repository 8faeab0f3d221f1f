use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::emotion::Emotion;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    #[serde(rename = "Review")]
    pub review: String,
    #[serde(rename = "Emotion")]
    pub emotion: Emotion,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionReport {
    pub rows: Vec<ReviewRow>,
}

impl EmotionReport {
    pub fn new(reviews: Vec<String>, emotions: Vec<Emotion>) -> Result<Self> {
        if reviews.len() != emotions.len() {
            return Err(Error::LengthMismatch {
                reviews: reviews.len(),
                emotions: emotions.len(),
            });
        }
        let rows = reviews
            .into_iter()
            .zip(emotions)
            .map(|(review, emotion)| ReviewRow { review, emotion })
            .collect();
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Count per label that occurs, most frequent first; ties keep class order.
    pub fn distribution(&self) -> Vec<(Emotion, usize)> {
        let mut counts: HashMap<Emotion, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(row.emotion).or_insert(0) += 1;
        }
        let mut counts: Vec<(Emotion, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = WriterBuilder::new().has_headers(true).from_path(path)?;
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let row: ReviewRow = result?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// Writes `reviews-<timestamp>.csv` under `dir` and returns its path.
    pub fn save_timestamped(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        let path = dir.join(format!("reviews-{}.csv", timestamp));
        self.save_csv(&path)?;
        info!(path = %path.display(), rows = self.len(), "saved results");
        Ok(path)
    }
}
