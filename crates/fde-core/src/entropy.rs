//! Narrative entropy: lexical and syntactic disorder plus sentence-to-sentence
//! incoherence, combined per segment.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{Analyzer, ModuleKind, ModuleReport};
use crate::annotation::{Annotator, Document};
use crate::constants::{HIGH_ENTROPY_PERCENTILE, INCOHERENCE_WEIGHT, LEXICAL_WEIGHT, SYNTACTIC_WEIGHT};
use crate::stats::{self, ordered_counts, shannon_entropy};

/// Per segment, per sentence, per word: character entropy of the word.
pub type EntropyHeatmap = Vec<Vec<Vec<f64>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighEntropySegment {
    pub segment_index: usize,
    pub entropy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntropyReport {
    pub entropy_values: Vec<f64>,
    pub mean_entropy: f64,
    pub max_entropy: f64,
    pub entropy_variance: f64,
    pub high_entropy_segments: Vec<HighEntropySegment>,
    pub entropy_gradient: Vec<f64>,
    pub lexical_entropy: Vec<f64>,
    pub syntactic_entropy: Vec<f64>,
    pub semantic_coherence: Vec<f64>,
}

pub struct NarrativeEntropyScanner {
    annotator: Arc<dyn Annotator>,
}

impl NarrativeEntropyScanner {
    pub fn new(annotator: Arc<dyn Annotator>) -> Self {
        Self { annotator }
    }

    pub fn scan(&self, docs: &[Document]) -> EntropyReport {
        if docs.is_empty() {
            return EntropyReport::default();
        }

        let lexical: Vec<f64> = docs.iter().map(lexical_entropy).collect();
        let syntactic: Vec<f64> = docs.iter().map(syntactic_entropy).collect();
        let coherence: Vec<f64> = docs.iter().map(|d| self.semantic_coherence(d)).collect();

        let combined: Vec<f64> = lexical
            .iter()
            .zip(&syntactic)
            .zip(&coherence)
            .map(|((l, s), c)| LEXICAL_WEIGHT * l + SYNTACTIC_WEIGHT * s + INCOHERENCE_WEIGHT * (1.0 - c))
            .collect();

        let gradient: Vec<f64> = combined.windows(2).map(|w| w[1] - w[0]).collect();

        let threshold = stats::flag_threshold(&combined, HIGH_ENTROPY_PERCENTILE);
        let high: Vec<HighEntropySegment> = combined
            .iter()
            .enumerate()
            .filter(|(_, e)| **e > threshold)
            .map(|(segment_index, e)| HighEntropySegment {
                segment_index,
                entropy: *e,
            })
            .collect();

        debug!(
            segments = docs.len(),
            threshold,
            flagged = high.len(),
            "narrative entropy complete"
        );

        EntropyReport {
            mean_entropy: stats::mean(&combined),
            max_entropy: stats::max(&combined),
            entropy_variance: stats::variance(&combined),
            high_entropy_segments: high,
            entropy_gradient: gradient,
            entropy_values: combined,
            lexical_entropy: lexical,
            syntactic_entropy: syntactic,
            semantic_coherence: coherence,
        }
    }

    /// Mean similarity of adjacent sentences; a lone sentence is fully coherent.
    fn semantic_coherence(&self, doc: &Document) -> f64 {
        if doc.sentences.len() <= 1 {
            return 1.0;
        }
        let sims: Vec<f64> = (1..doc.sentences.len())
            .map(|i| {
                self.annotator
                    .sentence_similarity(doc.sentence(i - 1), doc.sentence(i))
            })
            .collect();
        stats::mean(&sims).clamp(0.0, 1.0)
    }
}

impl Analyzer for NarrativeEntropyScanner {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Entropy
    }

    fn analyze(&mut self, docs: &[Document]) -> ModuleReport {
        ModuleReport::Entropy(self.scan(docs))
    }
}

fn lexical_entropy(doc: &Document) -> f64 {
    let counts = ordered_counts(doc.words().map(|t| t.lemma.as_str()));
    shannon_entropy(counts.into_iter().map(|(_, c)| c))
}

fn syntactic_entropy(doc: &Document) -> f64 {
    let counts = ordered_counts(doc.tokens.iter().map(|t| t.dep.as_str()));
    shannon_entropy(counts.into_iter().map(|(_, c)| c))
}

fn word_entropy(word: &str) -> f64 {
    let counts = ordered_counts(word.to_lowercase().chars());
    shannon_entropy(counts.into_iter().map(|(_, c)| c))
}

/// Character-entropy grid for rendering. Rows of one segment are padded with
/// zeros to its longest sentence.
pub fn entropy_heatmap(docs: &[Document]) -> EntropyHeatmap {
    docs.iter()
        .map(|doc| {
            let mut rows: Vec<Vec<f64>> = (0..doc.sentences.len())
                .map(|s| {
                    doc.sentence(s)
                        .iter()
                        .filter(|t| t.is_word())
                        .map(|t| word_entropy(&t.text))
                        .collect()
                })
                .collect();
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            for row in &mut rows {
                row.resize(width, 0.0);
            }
            rows
        })
        .collect()
}
