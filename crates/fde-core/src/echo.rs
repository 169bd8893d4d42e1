//! Echo patterns: phrases repeated across the text and how far their
//! surrounding contexts have moved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{Analyzer, ModuleKind, ModuleReport};
use crate::annotation::Document;
use crate::constants::{
    CONTEXT_RADIUS, CONTEXT_SHIFT_THRESHOLD, ECHO_INTENSITY_THRESHOLD, ECHO_MAX_NGRAM,
    ECHO_MIN_NGRAM, NEUTRAL_CONTEXT_SIMILARITY, TOP_ECHOES,
};
use crate::stats;
use crate::vector::context_similarity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoOccurrence {
    pub segment_index: usize,
    /// Character span of the phrase within the segment.
    pub start: usize,
    pub end: usize,
    /// `before[phrase]after`, up to 50 characters each side.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextShift {
    pub from_segment: usize,
    pub to_segment: usize,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoPattern {
    pub phrase: String,
    pub count: usize,
    pub mean_context_similarity: f64,
    pub intensity: f64,
    pub context_shifts: Vec<ContextShift>,
    pub occurrences: Vec<EchoOccurrence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EchoReport {
    pub echo_patterns: Vec<EchoPattern>,
    pub echo_count: usize,
    pub mean_intensity: f64,
    pub top_echoes: Vec<(String, f64)>,
    /// Per-segment intensity normalized by word count.
    pub echo_intensity: Vec<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EchoPatternEngine;

impl EchoPatternEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn find(&self, docs: &[Document]) -> EchoReport {
        if docs.is_empty() {
            return EchoReport::default();
        }

        let joined = docs
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut candidates: Vec<(String, usize, Vec<EchoOccurrence>)> = repeated_ngrams(&joined)
            .into_iter()
            .filter_map(|(phrase, count)| {
                let occurrences = locate(&phrase, docs);
                (occurrences.len() >= 2).then_some((phrase, count, occurrences))
            })
            .collect();
        // Most repeated n-grams first; stable within equal counts.
        candidates.sort_by_key(|(_, count, _)| std::cmp::Reverse(*count));

        let mut patterns: Vec<EchoPattern> = candidates
            .into_iter()
            .filter_map(|(phrase, _, occurrences)| score(phrase, occurrences))
            .collect();
        patterns.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));

        let mut echo_intensity = vec![0.0; docs.len()];
        for pattern in &patterns {
            for occ in &pattern.occurrences {
                if let Some(slot) = echo_intensity.get_mut(occ.segment_index) {
                    *slot += pattern.intensity;
                }
            }
        }
        for (slot, doc) in echo_intensity.iter_mut().zip(docs) {
            let words = doc.word_count();
            if words > 0 {
                *slot /= words as f64;
            }
        }

        let intensities: Vec<f64> = patterns.iter().map(|p| p.intensity).collect();
        let top_echoes = patterns
            .iter()
            .take(TOP_ECHOES)
            .map(|p| (p.phrase.clone(), p.intensity))
            .collect();

        debug!(echoes = patterns.len(), "echo patterns complete");

        EchoReport {
            echo_count: patterns.len(),
            mean_intensity: stats::mean(&intensities),
            top_echoes,
            echo_patterns: patterns,
            echo_intensity,
        }
    }
}

impl Analyzer for EchoPatternEngine {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Echo
    }

    fn analyze(&mut self, docs: &[Document]) -> ModuleReport {
        ModuleReport::Echo(self.find(docs))
    }
}

/// Whitespace word n-grams seen more than once, in first-seen order.
fn repeated_ngrams(text: &str) -> Vec<(String, usize)> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < ECHO_MIN_NGRAM {
        return Vec::new();
    }
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for n in ECHO_MIN_NGRAM..=ECHO_MAX_NGRAM.min(words.len()) {
        for window in words.windows(n) {
            let gram = window.join(" ");
            let c = counts.entry(gram.clone()).or_insert(0);
            if *c == 0 {
                order.push(gram);
            }
            *c += 1;
        }
    }
    order
        .into_iter()
        .filter_map(|g| {
            let c = counts[&g];
            (c > 1).then_some((g, c))
        })
        .collect()
}

fn context_window(text: &str, byte_start: usize, byte_end: usize) -> (usize, usize, String) {
    let start = text[..byte_start].chars().count();
    let phrase_chars = text[byte_start..byte_end].chars().count();
    let end = start + phrase_chars;

    let chars: Vec<char> = text.chars().collect();
    let from = start.saturating_sub(CONTEXT_RADIUS);
    let to = (end + CONTEXT_RADIUS).min(chars.len());
    let before: String = chars[from..start].iter().collect();
    let after: String = chars[end..to].iter().collect();
    (
        start,
        end,
        format!("{before}[{}]{after}", &text[byte_start..byte_end]),
    )
}

/// Every non-overlapping literal occurrence of `phrase`, segment by segment.
fn locate(phrase: &str, docs: &[Document]) -> Vec<EchoOccurrence> {
    docs.iter()
        .flat_map(|doc| {
            doc.text
                .match_indices(phrase)
                .map(|(pos, m)| {
                    let (start, end, context) = context_window(&doc.text, pos, pos + m.len());
                    EchoOccurrence {
                        segment_index: doc.index,
                        start,
                        end,
                        context,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn similarity_or_neutral(a: &str, b: &str) -> f64 {
    context_similarity(a, b).unwrap_or_else(|e| {
        debug!(error = %e, "using neutral context similarity");
        NEUTRAL_CONTEXT_SIMILARITY
    })
}

fn score(phrase: String, occurrences: Vec<EchoOccurrence>) -> Option<EchoPattern> {
    let mut pairwise = Vec::new();
    for i in 0..occurrences.len() {
        for j in (i + 1)..occurrences.len() {
            pairwise.push(similarity_or_neutral(
                &occurrences[i].context,
                &occurrences[j].context,
            ));
        }
    }
    let mean_context_similarity = if pairwise.is_empty() {
        1.0
    } else {
        stats::mean(&pairwise)
    };
    let count = occurrences.len();
    let intensity = count as f64 * (1.0 - mean_context_similarity);

    let context_shifts = occurrences
        .windows(2)
        .filter_map(|w| {
            let similarity = similarity_or_neutral(&w[0].context, &w[1].context);
            (similarity < CONTEXT_SHIFT_THRESHOLD).then(|| ContextShift {
                from_segment: w[0].segment_index,
                to_segment: w[1].segment_index,
                similarity,
            })
        })
        .collect();

    (intensity > ECHO_INTENSITY_THRESHOLD).then(|| EchoPattern {
        phrase,
        count,
        mean_context_similarity,
        intensity,
        context_shifts,
        occurrences,
    })
}
