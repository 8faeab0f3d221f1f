// src/vectorizer.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// On-disk form of a fitted vectorizer.
#[derive(Debug, Deserialize)]
struct VocabularyFile {
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
    vocabulary: HashMap<String, usize>,
}

fn default_lowercase() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

/// Bag-of-words term counter over a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    lowercase: bool,
    token_pattern: Regex,
    vocab: HashMap<String, usize>,
}

impl CountVectorizer {
    pub fn new(lowercase: bool, token_pattern: &str, vocab: HashMap<String, usize>) -> Result<Self> {
        let mut columns: Vec<usize> = vocab.values().copied().collect();
        columns.sort_unstable();
        if columns.iter().enumerate().any(|(expected, &column)| expected != column) {
            return Err(Error::InvalidModel(
                "vocabulary columns must cover 0..n exactly once".into(),
            ));
        }

        Ok(Self {
            lowercase,
            token_pattern: Regex::new(token_pattern)?,
            vocab,
        })
    }

    /// Columns are assigned in sorted term order.
    pub fn from_terms<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        terms.sort();
        terms.dedup();
        let vocab = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        Self::new(true, DEFAULT_TOKEN_PATTERN, vocab)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let file: VocabularyFile = serde_json::from_str(&raw)?;
        Self::new(file.lowercase, &file.token_pattern, file.vocabulary)
    }

    pub fn n_features(&self) -> usize {
        self.vocab.len()
    }

    pub fn tokenize(&self, document: &str) -> Vec<String> {
        let document = if self.lowercase {
            document.to_lowercase()
        } else {
            document.to_string()
        };
        self.token_pattern
            .find_iter(&document)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Dense row-major count matrix of shape `(documents.len(), n_features)`.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<f32> {
        let width = self.n_features();
        let mut matrix = vec![0.0f32; documents.len() * width];

        for (row, document) in documents.iter().enumerate() {
            for token in self.tokenize(document.as_ref()) {
                if let Some(&column) = self.vocab.get(&token) {
                    matrix[row * width + column] += 1.0;
                }
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn counts_known_terms_only() {
        let vectorizer = CountVectorizer::from_terms(["love", "hate", "product"]).unwrap();
        // sorted: hate=0, love=1, product=2
        let matrix = vectorizer.transform(&["I LOVE this product, love love it!", "meh"]);
        assert_eq!(matrix, vec![0.0, 3.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn single_character_tokens_are_dropped() {
        let vectorizer = CountVectorizer::from_terms(["a", "ok"]).unwrap();
        assert_eq!(vectorizer.tokenize("A ok b"), vec!["ok".to_string()]);
        assert_eq!(vectorizer.transform(&["a a ok"]), vec![0.0, 1.0]);
    }

    #[test]
    fn unicode_words_tokenize() {
        let vectorizer = CountVectorizer::from_terms(["très", "déçu"]).unwrap();
        assert_eq!(vectorizer.tokenize("Très déçu!"), vec!["très", "déçu"]);
    }

    #[test]
    fn loads_vocabulary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"vocabulary": {{"great": 1, "awful": 0}}}}"#).unwrap();

        let vectorizer = CountVectorizer::from_json_file(file.path()).unwrap();
        assert_eq!(vectorizer.n_features(), 2);
        assert_eq!(vectorizer.transform(&["Great, great... awful"]), vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_sparse_columns() {
        let vocab = HashMap::from([("one".to_string(), 0), ("two".to_string(), 2)]);
        assert!(matches!(
            CountVectorizer::new(true, DEFAULT_TOKEN_PATTERN, vocab),
            Err(Error::InvalidModel(_))
        ));
    }
}
