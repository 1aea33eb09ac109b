//! TF-IDF vectorization of movie tags.
//!
//! ## Algorithm
//! 1. Tokenize: lowercase, keep runs of 2+ word characters
//! 2. Drop English stop words, then form unigrams and bigrams
//! 3. Keep terms appearing in at least `min_df` documents
//! 4. If more than `max_features` remain, keep the most frequent ones
//! 5. Weight raw counts by smoothed idf, L2-normalize each row
//!
//! The vocabulary is indexed alphabetically.

use crate::error::{ModelError, Result};
use crate::stop_words::is_stop_word;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Sparse row: `(term index, weight)` sorted by term index
pub type SparseVector = Vec<(u32, f32)>;

/// Vectorizer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfidfVectorizer {
    max_features: usize,
    min_df: usize,
    ngram_range: (usize, usize),
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            max_features: 5000,
            min_df: 2,
            ngram_range: (1, 2),
        }
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vocabulary cap (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Minimum number of documents a term must appear in (default: 2)
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Inclusive n-gram range (default: unigrams and bigrams)
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n.max(1), max_n.max(min_n.max(1)));
        self
    }

    /// Terms of one document, in order, with repeats
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .filter(|token| !is_stop_word(token))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Learn vocabulary and idf from `docs` and return their TF-IDF rows
    pub fn fit_transform(&self, docs: &[&str]) -> Result<TfidfMatrix> {
        if docs.is_empty() {
            return Err(ModelError::EmptyInput("no documents to vectorize".to_string()));
        }

        // Per-document term counts
        let doc_counts: Vec<HashMap<String, u32>> = docs
            .par_iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for term in self.analyze(doc) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // (document frequency, corpus frequency) per term
        let mut stats: HashMap<&str, (usize, u64)> = HashMap::new();
        for counts in &doc_counts {
            for (term, &count) in counts {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u64::from(count);
            }
        }
        let seen_terms = stats.len();

        let mut kept: Vec<(&str, usize, u64)> = stats
            .into_iter()
            .filter(|&(_, (df, _))| df >= self.min_df)
            .map(|(term, (df, tf))| (term, df, tf))
            .collect();

        if kept.len() > self.max_features {
            kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
            kept.truncate(self.max_features);
        }
        if kept.is_empty() {
            return Err(ModelError::EmptyVocabulary {
                min_df: self.min_df,
            });
        }
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = docs.len() as f64;
        let vocabulary: Vec<String> = kept.iter().map(|(term, _, _)| term.to_string()).collect();
        let idf: Vec<f32> = kept
            .iter()
            .map(|&(_, df, _)| (((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0) as f32)
            .collect();

        debug!(
            "Vocabulary: {} of {} terms kept (min_df={}, max_features={})",
            vocabulary.len(),
            seen_terms,
            self.min_df,
            self.max_features
        );

        let term_index: HashMap<&str, u32> = vocabulary
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.as_str(), idx as u32))
            .collect();

        let rows: Vec<SparseVector> = doc_counts
            .par_iter()
            .map(|counts| weigh(counts.iter().map(|(t, &c)| (t.as_str(), c)), &term_index, &idf))
            .collect();

        info!(
            "TF-IDF matrix: {} documents x {} terms",
            rows.len(),
            vocabulary.len()
        );

        Ok(TfidfMatrix {
            vocabulary,
            idf,
            rows,
        })
    }
}

/// Count x idf for known terms, L2-normalized, sorted by term index
fn weigh<'a>(
    counts: impl Iterator<Item = (&'a str, u32)>,
    term_index: &HashMap<&str, u32>,
    idf: &[f32],
) -> SparseVector {
    let mut row: Vec<(u32, f64)> = counts
        .filter_map(|(term, count)| {
            term_index
                .get(term)
                .map(|&idx| (idx, f64::from(count) * f64::from(idf[idx as usize])))
        })
        .collect();
    row.sort_by_key(|&(idx, _)| idx);

    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        row.into_iter().map(|(idx, w)| (idx, (w / norm) as f32)).collect()
    } else {
        Vec::new()
    }
}

/// Fitted TF-IDF representation of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfMatrix {
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Number of documents (rows)
    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    /// Vocabulary size (columns)
    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_docs(), self.n_terms())
    }

    pub fn row(&self, doc: usize) -> Option<&[(u32, f32)]> {
        self.rows.get(doc).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|probe| probe.as_str().cmp(term))
            .ok()
    }

    /// Structural checks for a deserialized matrix
    pub fn validate(&self) -> Result<()> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(ModelError::DimensionMismatch {
                what: "idf weights".to_string(),
                expected: self.vocabulary.len(),
                found: self.idf.len(),
            });
        }
        if !self.vocabulary.windows(2).all(|w| w[0] < w[1]) {
            return Err(ModelError::InvalidModel(
                "vocabulary is not sorted".to_string(),
            ));
        }
        let n_terms = self.n_terms() as u32;
        for (doc, row) in self.rows.iter().enumerate() {
            if row.iter().any(|&(idx, _)| idx >= n_terms) {
                return Err(ModelError::InvalidModel(format!(
                    "row {} references a term outside the vocabulary",
                    doc
                )));
            }
        }
        Ok(())
    }
}
