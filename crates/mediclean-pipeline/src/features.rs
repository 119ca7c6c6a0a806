//! TF-IDF feature extraction
//!
//! Text is lowercased and split into tokens of two or more word characters.
//! The vocabulary keeps the `max_features` terms with the highest corpus-wide
//! term frequency; ties are broken by lexical order so the selection is a
//! pure function of the corpus. Columns are laid out in lexical order.
//!
//! Weights are raw counts times the smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1`, with each row L2-normalized.

use mediclean_core::{Error, Result};
use ndarray::{Array1, Array2};
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Dense document-term matrix with its column labels
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// One row per document, one column per vocabulary term
    pub features: Array2<f64>,

    /// Term for each column
    pub vocabulary: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// TF-IDF vectorizer with a bounded, frequency-ranked vocabulary
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    token_regex: Regex,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Array1<f64>,
}

impl TfidfVectorizer {
    /// Create a vectorizer keeping at most `max_features` terms
    pub fn new(max_features: usize) -> Result<Self> {
        if max_features == 0 {
            return Err(Error::config("max_features must be at least 1"));
        }

        Ok(Self {
            max_features,
            token_regex: Regex::new(r"\b\w\w+\b")
                .map_err(|e| Error::data(format!("Failed to compile token regex: {}", e)))?,
            vocabulary: Vec::new(),
            index: HashMap::new(),
            idf: Array1::zeros(0),
        })
    }

    /// Split a document into lowercase tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Learn the vocabulary and IDF weights
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::data("cannot build a vocabulary from an empty corpus"));
        }

        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|d| self.tokenize(d.as_ref()))
            .collect();

        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &tokenized {
            for term in doc {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        if term_freq.is_empty() {
            return Err(Error::data(
                "empty vocabulary; notes contain no tokens of two or more characters",
            ));
        }

        let mut ranked: Vec<(&str, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        self.index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        self.vocabulary = vocabulary;

        let mut doc_freq = vec![0usize; self.vocabulary.len()];
        for doc in &tokenized {
            let mut seen = vec![false; self.vocabulary.len()];
            for term in doc {
                if let Some(&idx) = self.index.get(term) {
                    if !seen[idx] {
                        seen[idx] = true;
                        doc_freq[idx] += 1;
                    }
                }
            }
        }

        let n_docs = documents.len() as f64;
        self.idf = doc_freq
            .into_iter()
            .map(|df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        debug!(
            documents = documents.len(),
            vocabulary = self.vocabulary.len(),
            "Fitted TF-IDF vocabulary"
        );
        Ok(())
    }

    /// Weight documents over the fitted vocabulary
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<Array2<f64>> {
        if self.vocabulary.is_empty() {
            return Err(Error::model("vectorizer has not been fitted"));
        }

        let mut matrix = Array2::zeros((documents.len(), self.vocabulary.len()));
        for (row_idx, doc) in documents.iter().enumerate() {
            let mut row = matrix.row_mut(row_idx);
            for term in self.tokenize(doc.as_ref()) {
                if let Some(&idx) = self.index.get(&term) {
                    row[idx] += 1.0;
                }
            }

            row *= &self.idf;

            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }

        Ok(matrix)
    }

    /// Fit on a corpus and transform that same corpus
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<FeatureMatrix> {
        self.fit(documents)?;
        Ok(FeatureMatrix {
            features: self.transform(documents)?,
            vocabulary: self.vocabulary.clone(),
        })
    }

    /// Fitted terms in column order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Fitted IDF weight per column
    pub fn idf(&self) -> &Array1<f64> {
        &self.idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "chest pain chest pain REDACTED",
            "mild pain no history",
            "chest tightness a b",
        ]
    }

    #[test]
    fn test_vocabulary_is_lexical_and_lowercased() {
        let mut vectorizer = TfidfVectorizer::new(5000).unwrap();
        vectorizer.fit(&corpus()).unwrap();

        assert_eq!(
            vectorizer.vocabulary(),
            &["chest", "history", "mild", "no", "pain", "redacted", "tightness"]
        );
    }

    #[test]
    fn test_max_features_uses_frequency_then_lexical_tie_break() {
        let mut vectorizer = TfidfVectorizer::new(3).unwrap();
        vectorizer.fit(&corpus()).unwrap();

        // chest=3, pain=3, then five terms tied at 1: history wins lexically
        assert_eq!(vectorizer.vocabulary(), &["chest", "history", "pain"]);
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let mut vectorizer = TfidfVectorizer::new(5000).unwrap();
        let matrix = vectorizer.fit_transform(&corpus()).unwrap();

        assert_eq!(matrix.n_samples(), 3);
        for row in matrix.features.rows() {
            let norm = row.dot(&row).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_idf_is_smoothed() {
        let mut vectorizer = TfidfVectorizer::new(5000).unwrap();
        vectorizer.fit(&corpus()).unwrap();

        let chest = vectorizer.vocabulary().iter().position(|t| t == "chest").unwrap();
        let mild = vectorizer.vocabulary().iter().position(|t| t == "mild").unwrap();
        assert!((vectorizer.idf()[chest] - ((4.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!((vectorizer.idf()[mild] - (2.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let first = TfidfVectorizer::new(4).unwrap().fit_transform(&corpus()).unwrap();
        let second = TfidfVectorizer::new(4).unwrap().fit_transform(&corpus()).unwrap();

        assert_eq!(first.vocabulary, second.vocabulary);
        let first_bits: Vec<u64> = first.features.iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u64> = second.features.iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn test_empty_vocabulary_is_data_error() {
        let mut vectorizer = TfidfVectorizer::new(10).unwrap();
        let err = vectorizer.fit(&["a b", ""]).unwrap_err();
        assert_eq!(err.kind(), "data_error");
    }
}
