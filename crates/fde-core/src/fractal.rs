//! Fractal drift: how segment vocabularies shift, where earlier material
//! recurs, and which sentences carry metaphors.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzer::{Analyzer, ModuleKind, ModuleReport};
use crate::annotation::{Document, Token};
use crate::constants::{
    COMMON_PHRASES_KEPT, COMMON_PHRASE_MAX, COMMON_PHRASE_MIN, DRIFT_TERMS,
    FRACTAL_SIMILARITY_THRESHOLD, MAX_DOC_FREQ, MAX_TERM_NGRAM,
};
use crate::lexicon::Lexicons;
use crate::stats;
use crate::vector::{TfidfMatrix, TfidfVectorizer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftVector {
    pub segment_index: usize,
    pub positive_drift: Vec<(String, f64)>,
    pub negative_drift: Vec<(String, f64)>,
    pub drift_magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalSignature {
    pub segment_pair: (usize, usize),
    pub similarity: f64,
    pub common_phrases: Vec<String>,
    pub distance: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metaphor {
    pub text: String,
    pub source_domain: String,
    pub target_domain: String,
    pub indicator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaphorCluster {
    pub segment_index: usize,
    pub metaphors: Vec<Metaphor>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FractalReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub drift_vectors: Vec<DriftVector>,
    pub fractal_signatures: Vec<FractalSignature>,
    pub metaphor_clusters: Vec<MetaphorCluster>,
    pub recursion_score: f64,
    pub narrative_stability: f64,
}

pub struct FractalDriftDetector {
    lexicons: Arc<Lexicons>,
    vectorizer: TfidfVectorizer,
}

impl FractalDriftDetector {
    pub fn new(lexicons: Arc<Lexicons>) -> Self {
        Self {
            lexicons,
            vectorizer: TfidfVectorizer {
                max_ngram: MAX_TERM_NGRAM,
                max_df: MAX_DOC_FREQ,
                remove_stop_words: true,
            },
        }
    }

    pub fn detect(&self, docs: &[Document]) -> FractalReport {
        if docs.is_empty() {
            return FractalReport::default();
        }

        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        let matrix = match self.vectorizer.fit_transform(&texts) {
            Ok(m) => m,
            Err(e) => {
                warn!(segments = docs.len(), error = %e, "fractal drift vectorization failed");
                return FractalReport {
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        };
        let similarity = matrix.similarity_matrix();

        let drift_vectors = drift_vectors(&matrix);
        let metaphor_clusters = self.metaphor_clusters(docs);
        let fractal_signatures = fractal_signatures(docs, &similarity);
        let recursion_score = recursion_score(&similarity);

        let total_drift: f64 = drift_vectors.iter().map(|d| d.drift_magnitude).sum();
        let narrative_stability = 1.0 - total_drift / drift_vectors.len().max(1) as f64;

        debug!(
            vocabulary = matrix.vocabulary.len(),
            signatures = fractal_signatures.len(),
            recursion_score,
            "fractal drift complete"
        );

        FractalReport {
            error: None,
            drift_vectors,
            fractal_signatures,
            metaphor_clusters,
            recursion_score,
            narrative_stability,
        }
    }

    fn metaphor_clusters(&self, docs: &[Document]) -> Vec<MetaphorCluster> {
        docs.iter()
            .filter_map(|doc| {
                let metaphors: Vec<Metaphor> = (0..doc.sentences.len())
                    .filter_map(|s| self.metaphor_in(doc, s))
                    .collect();
                (!metaphors.is_empty()).then(|| MetaphorCluster {
                    segment_index: doc.index,
                    count: metaphors.len(),
                    metaphors,
                })
            })
            .collect()
    }

    fn metaphor_in(&self, doc: &Document, sentence: usize) -> Option<Metaphor> {
        let is_indicator =
            |t: &Token| self.lexicons.metaphor_indicators.contains(t.text.to_lowercase().as_str());
        let range = doc.sentences[sentence].clone();
        let tokens = &doc.tokens[range.clone()];

        let indicator = tokens.iter().find(|t| is_indicator(*t))?;
        let root = range.clone().find(|&i| doc.tokens[i].dep == "ROOT")?;

        let mut source = Vec::new();
        let mut target = Vec::new();
        for token in tokens.iter().filter(|t| t.head == root) {
            match token.dep.as_str() {
                "nsubj" | "nsubjpass" => target.push(token.text.as_str()),
                "dobj" | "pobj" | "attr" => source.push(token.text.as_str()),
                _ => {}
            }
        }

        Some(Metaphor {
            text: doc.sentence_text(sentence).to_string(),
            source_domain: source.join(" "),
            target_domain: target.join(" "),
            indicator: indicator.text.clone(),
        })
    }
}

impl Analyzer for FractalDriftDetector {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Drift
    }

    fn analyze(&mut self, docs: &[Document]) -> ModuleReport {
        ModuleReport::Drift(self.detect(docs))
    }
}

fn drift_vectors(matrix: &TfidfMatrix) -> Vec<DriftVector> {
    (1..matrix.len())
        .map(|i| {
            let delta: Vec<f64> = matrix.rows[i]
                .iter()
                .zip(&matrix.rows[i - 1])
                .map(|(cur, prev)| cur - prev)
                .collect();

            let mut order: Vec<usize> = (0..delta.len()).collect();
            order.sort_by(|&a, &b| delta[b].total_cmp(&delta[a]).then(a.cmp(&b)));
            let pick = |idx: usize| (matrix.vocabulary[idx].clone(), delta[idx]);
            let positive_drift = order
                .iter()
                .copied()
                .filter(|&k| delta[k] > 0.0)
                .take(DRIFT_TERMS)
                .map(pick)
                .collect();

            order.sort_by(|&a, &b| delta[a].total_cmp(&delta[b]).then(a.cmp(&b)));
            let negative_drift = order
                .iter()
                .copied()
                .filter(|&k| delta[k] < 0.0)
                .take(DRIFT_TERMS)
                .map(pick)
                .collect();

            DriftVector {
                segment_index: i,
                positive_drift,
                negative_drift,
                drift_magnitude: delta.iter().map(|d| d * d).sum::<f64>().sqrt(),
            }
        })
        .collect()
}

fn fractal_signatures(docs: &[Document], similarity: &[Vec<f64>]) -> Vec<FractalSignature> {
    let n = docs.len();
    let mut signatures = Vec::new();
    for i in 0..n {
        for j in (i + 2)..n {
            let sim = similarity[i][j];
            if sim <= FRACTAL_SIMILARITY_THRESHOLD {
                continue;
            }
            let mut phrases =
                common_phrases(&docs[i].text.to_lowercase(), &docs[j].text.to_lowercase());
            if phrases.is_empty() {
                continue;
            }
            phrases.truncate(COMMON_PHRASES_KEPT);
            signatures.push(FractalSignature {
                segment_pair: (i, j),
                similarity: sim,
                common_phrases: phrases,
                distance: j - i,
            });
        }
    }
    signatures.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    signatures
}

/// Word n-grams (whitespace tokens) shared verbatim by both texts, shortest
/// first, then by position in `a`.
pub fn common_phrases(a: &str, b: &str) -> Vec<String> {
    let wa: Vec<&str> = a.split_whitespace().collect();
    let wb: Vec<&str> = b.split_whitespace().collect();
    let upper = COMMON_PHRASE_MAX.min(wa.len().min(wb.len()));

    let mut phrases = Vec::new();
    for n in COMMON_PHRASE_MIN..=upper {
        let in_b: HashSet<String> = wb.windows(n).map(|w| w.join(" ")).collect();
        let mut seen = HashSet::new();
        for window in wa.windows(n) {
            let phrase = window.join(" ");
            if in_b.contains(&phrase) && seen.insert(phrase.clone()) {
                phrases.push(phrase);
            }
        }
    }
    phrases
}

fn recursion_score(similarity: &[Vec<f64>]) -> f64 {
    let n = similarity.len();
    if n <= 2 {
        return 0.0;
    }
    let values: Vec<f64> = (0..n)
        .flat_map(|i| (0..n).filter(move |&j| i.abs_diff(j) >= 2).map(move |j| (i, j)))
        .map(|(i, j)| similarity[i][j])
        .collect();
    stats::mean(&values)
}
