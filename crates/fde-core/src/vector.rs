//! TF-IDF vectors and cosine similarity over segment texts.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AnalysisError, Result};
use crate::stopwords::is_stop_word;

static TERM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    pub max_ngram: usize,
    /// Terms found in more than `max_df * N` documents are pruned.
    pub max_df: f64,
    pub remove_stop_words: bool,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            max_ngram: 1,
            max_df: 1.0,
            remove_stop_words: false,
        }
    }
}

/// Dense, L2-normalized TF-IDF rows over a lexicographically sorted vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TfidfVectorizer {
    fn analyze(&self, doc: &str) -> Vec<String> {
        let lower = doc.to_lowercase();
        let words: Vec<&str> = TERM
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|w| !(self.remove_stop_words && is_stop_word(w)))
            .collect();

        let mut terms = Vec::new();
        for n in 1..=self.max_ngram.max(1) {
            if n > words.len() {
                break;
            }
            for window in words.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    pub fn fit_transform(&self, docs: &[&str]) -> Result<TfidfMatrix> {
        let counts: Vec<HashMap<String, usize>> = docs
            .iter()
            .map(|d| {
                let mut c = HashMap::new();
                for term in self.analyze(d) {
                    *c.entry(term).or_insert(0) += 1;
                }
                c
            })
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for c in &counts {
            for term in c.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        if doc_freq.is_empty() {
            return Err(AnalysisError::Vectorization(
                "empty vocabulary; documents contain only stop words".to_string(),
            ));
        }

        let n_docs = docs.len() as f64;
        let max_doc_count = self.max_df * n_docs;
        doc_freq.retain(|_, df| (*df as f64) <= max_doc_count);
        if doc_freq.is_empty() {
            return Err(AnalysisError::Vectorization(
                "no terms remain after pruning by document frequency".to_string(),
            ));
        }

        let vocabulary: Vec<String> = doc_freq.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f64> = doc_freq
            .values()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .iter()
            .map(|c| {
                let mut row: Vec<f64> = vocabulary
                    .iter()
                    .zip(&idf)
                    .map(|(term, w)| c.get(term).copied().unwrap_or(0) as f64 * w)
                    .collect();
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|v| *v /= norm);
                }
                row
            })
            .collect();

        Ok(TfidfMatrix { vocabulary, rows })
    }
}

impl TfidfMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cosine of two normalized rows, clamped to [0, 1].
    pub fn cosine(&self, i: usize, j: usize) -> f64 {
        let dot: f64 = self.rows[i]
            .iter()
            .zip(&self.rows[j])
            .map(|(a, b)| a * b)
            .sum();
        dot.clamp(0.0, 1.0)
    }

    pub fn similarity_matrix(&self) -> Vec<Vec<f64>> {
        (0..self.len())
            .map(|i| (0..self.len()).map(|j| self.cosine(i, j)).collect())
            .collect()
    }
}

/// Similarity of two short context windows.
pub fn context_similarity(a: &str, b: &str) -> Result<f64> {
    let matrix = TfidfVectorizer::default()
        .fit_transform(&[a, b])
        .map_err(|_| AnalysisError::ContextSimilarity)?;
    Ok(matrix.cosine(0, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn segment_vectorizer() -> TfidfVectorizer {
        TfidfVectorizer {
            max_ngram: 3,
            max_df: 0.9,
            remove_stop_words: true,
        }
    }

    #[test]
    fn test_vocabulary_sorted_with_ngrams() {
        let m = TfidfVectorizer {
            max_ngram: 2,
            ..Default::default()
        }
        .fit_transform(&["red river", "blue sky"])
        .unwrap();
        assert_eq!(
            m.vocabulary,
            vec!["blue", "blue sky", "red", "red river", "river", "sky"]
        );
    }

    #[test]
    fn test_rows_are_unit_length() {
        let m = segment_vectorizer()
            .fit_transform(&["the dark river runs", "a bright mirror shines", "dark mirror"])
            .unwrap();
        for row in &m.rows {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_single_document_is_vectorization_error() {
        let err = segment_vectorizer().fit_transform(&["only one segment here"]);
        assert!(matches!(err, Err(AnalysisError::Vectorization(_))));
    }

    #[test]
    fn test_stop_words_only_is_vectorization_error() {
        let err = segment_vectorizer().fit_transform(&["the and of", "it is"]);
        assert!(matches!(err, Err(AnalysisError::Vectorization(_))));
    }

    #[test]
    fn test_max_df_prunes_ubiquitous_terms() {
        let m = segment_vectorizer()
            .fit_transform(&["river stone", "river glass", "river smoke"])
            .unwrap();
        assert!(!m.vocabulary.iter().any(|t| t == "river"));
        assert!(m.vocabulary.iter().any(|t| t == "stone"));
    }

    #[test]
    fn test_identical_and_disjoint_similarity() {
        let m = TfidfVectorizer::default()
            .fit_transform(&["broken mirror", "broken mirror", "quiet garden"])
            .unwrap();
        assert_relative_eq!(m.cosine(0, 1), 1.0, epsilon = 1e-9);
        assert_eq!(m.cosine(0, 2), 0.0);
    }

    #[test]
    fn test_context_similarity_failure() {
        assert_eq!(context_similarity("a", "!"), Err(AnalysisError::ContextSimilarity));
        let s = context_similarity("the old house", "the new house").unwrap();
        assert!(s > 0.0 && s < 1.0);
    }
}
