//! Symbolic density: weighted symbol load per segment, category clusters,
//! emotional blackholes and grooming phrases.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{Analyzer, ModuleKind, ModuleReport};
use crate::annotation::Document;
use crate::constants::{BLACKHOLE_PERCENTILE, MIN_CLUSTER_SYMBOLS, TOP_SYMBOLS};
use crate::lexicon::{Lexicons, SymbolCategory};
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCluster {
    pub segment_index: usize,
    pub cluster_type: SymbolCategory,
    pub symbols: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalBlackhole {
    pub segment_index: usize,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroomingMatch {
    pub pattern: String,
    /// Matched text, lowercased.
    pub text: String,
    /// Character offsets into the segment.
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroomingDetection {
    pub segment_index: usize,
    pub matches: Vec<GroomingMatch>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolicReport {
    pub symbol_density: Vec<f64>,
    pub mean_density: f64,
    pub max_density: f64,
    pub top_symbols: Vec<String>,
    pub symbol_clusters: Vec<SymbolCluster>,
    pub emotional_blackholes: Vec<EmotionalBlackhole>,
    pub grooming_patterns: Vec<GroomingDetection>,
}

pub struct SymbolicDensityAnalyzer {
    lexicons: Arc<Lexicons>,
}

impl SymbolicDensityAnalyzer {
    pub fn new(lexicons: Arc<Lexicons>) -> Self {
        Self { lexicons }
    }

    /// Symbol lemmas found in a document, in token order, with merged weights.
    pub fn extract_symbols(&self, doc: &Document) -> Vec<(String, f64)> {
        doc.words()
            .filter_map(|t| {
                let lemma = t.lemma.to_lowercase();
                self.lexicons.symbol_weight(&lemma).map(|w| (lemma, w))
            })
            .collect()
    }

    /// Weighted symbol load per word.
    pub fn density(&self, doc: &Document) -> f64 {
        let total: f64 = self.extract_symbols(doc).iter().map(|(_, w)| w).sum();
        total / doc.word_count().max(1) as f64
    }

    pub fn measure(&self, docs: &[Document]) -> SymbolicReport {
        if docs.is_empty() {
            return SymbolicReport::default();
        }

        let per_segment: Vec<Vec<(String, f64)>> =
            docs.iter().map(|d| self.extract_symbols(d)).collect();
        let density: Vec<f64> = docs
            .iter()
            .zip(&per_segment)
            .map(|(doc, symbols)| {
                let total: f64 = symbols.iter().map(|(_, w)| w).sum();
                total / doc.word_count().max(1) as f64
            })
            .collect();

        let threshold = stats::flag_threshold(&density, BLACKHOLE_PERCENTILE);
        let emotional_blackholes = density
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > threshold)
            .map(|(segment_index, d)| EmotionalBlackhole {
                segment_index,
                density: *d,
            })
            .collect();

        let symbol_clusters = docs
            .iter()
            .zip(&per_segment)
            .flat_map(|(doc, symbols)| self.clusters(doc.index, symbols))
            .collect();

        let top_symbols = stats::most_common(
            per_segment.iter().flatten().map(|(s, _)| s.as_str()),
            TOP_SYMBOLS,
        )
        .into_iter()
        .map(|(s, _)| s.to_string())
        .collect();

        let grooming_patterns: Vec<GroomingDetection> =
            docs.iter().filter_map(|d| self.grooming(d)).collect();

        debug!(
            segments = docs.len(),
            grooming = grooming_patterns.len(),
            "symbolic density complete"
        );

        SymbolicReport {
            mean_density: stats::mean(&density),
            max_density: stats::max(&density),
            symbol_density: density,
            top_symbols,
            symbol_clusters,
            emotional_blackholes,
            grooming_patterns,
        }
    }

    fn clusters(&self, segment_index: usize, symbols: &[(String, f64)]) -> Vec<SymbolCluster> {
        if symbols.len() < MIN_CLUSTER_SYMBOLS {
            return Vec::new();
        }
        SymbolCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let members: Vec<String> = symbols
                    .iter()
                    .filter(|(s, _)| self.lexicons.in_category(category, s))
                    .map(|(s, _)| s.clone())
                    .collect();
                (members.len() >= MIN_CLUSTER_SYMBOLS).then(|| SymbolCluster {
                    segment_index,
                    cluster_type: category,
                    count: members.len(),
                    symbols: members,
                })
            })
            .collect()
    }

    fn grooming(&self, doc: &Document) -> Option<GroomingDetection> {
        let text = doc.text.as_str();
        let char_offset = |byte: usize| text[..byte].chars().count();
        let matches: Vec<GroomingMatch> = self
            .lexicons
            .grooming
            .iter()
            .flat_map(|g| {
                g.regex.find_iter(text).map(move |m| GroomingMatch {
                    pattern: g.pattern.to_string(),
                    text: m.as_str().to_lowercase(),
                    start: char_offset(m.start()),
                    end: char_offset(m.end()),
                })
            })
            .collect();
        (!matches.is_empty()).then(|| GroomingDetection {
            segment_index: doc.index,
            count: matches.len(),
            matches,
        })
    }
}

impl Analyzer for SymbolicDensityAnalyzer {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Symbolic
    }

    fn analyze(&mut self, docs: &[Document]) -> ModuleReport {
        ModuleReport::Symbolic(self.measure(docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotator, HeuristicAnnotator};
    use crate::text::Segment;
    use approx::assert_relative_eq;

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| {
                HeuristicAnnotator
                    .annotate(&Segment {
                        index,
                        text: t.to_string(),
                    })
                    .unwrap()
            })
            .collect()
    }

    fn analyzer() -> SymbolicDensityAnalyzer {
        SymbolicDensityAnalyzer::new(Lexicons::standard())
    }

    #[test]
    fn test_density_uses_merged_weights() {
        let lex = Lexicons::standard();
        let d = docs(&["heart and fear"]);
        let expected = (lex.symbol_weight("heart").unwrap() + lex.symbol_weight("fear").unwrap()) / 3.0;
        assert_relative_eq!(analyzer().density(&d[0]), expected);
    }

    #[test]
    fn test_no_symbols_zero_density() {
        let report = analyzer().measure(&docs(&["plain words only"]));
        assert_eq!(report.symbol_density, vec![0.0]);
        assert!(report.top_symbols.is_empty());
        assert!(report.emotional_blackholes.is_empty());
    }

    #[test]
    fn test_single_segment_is_never_blackhole() {
        let report = analyzer().measure(&docs(&["love and pain"]));
        assert!(report.symbol_density[0] > 0.0);
        assert!(report.emotional_blackholes.is_empty());
    }

    #[test]
    fn test_dense_segment_is_blackhole() {
        let report = analyzer().measure(&docs(&[
            "plain words only",
            "a quiet list of things",
            "love and pain",
        ]));
        assert_eq!(report.emotional_blackholes.len(), 1);
        assert_eq!(report.emotional_blackholes[0].segment_index, 2);
    }

    #[test]
    fn test_emotional_cluster() {
        let report = analyzer().measure(&docs(&["family, child, love, pain and more words here"]));
        let cluster = report
            .symbol_clusters
            .iter()
            .find(|c| c.cluster_type == SymbolCategory::Emotional)
            .expect("emotional cluster");
        assert!(cluster.count >= 3);
        assert_eq!(cluster.symbols.len(), cluster.count);
    }

    #[test]
    fn test_grooming_matches_case_insensitive_with_char_offsets() {
        let report = analyzer().measure(&docs(&["Héllo. Our Secret, truly."]));
        assert_eq!(report.grooming_patterns.len(), 1);
        let detection = &report.grooming_patterns[0];
        let m = &detection.matches[0];
        assert_eq!(m.pattern, "our secret");
        assert_eq!(m.text, "our secret");
        assert_eq!(m.start, 7);
        assert_eq!(m.end, 17);
    }

    #[test]
    fn test_top_symbols_frequency_order() {
        let report = analyzer().measure(&docs(&["pain love love", "love pain heart"]));
        assert_eq!(report.top_symbols[0], "love");
        assert_eq!(report.top_symbols[1], "pain");
    }
}
