//! The orchestrator: preprocess, segment, annotate, then hand the same
//! annotated segments to every registered analyzer.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyzer::{Analyzer, ModuleKind};
use crate::annotation::{Annotator, Document, HeuristicAnnotator};
use crate::constants::{DEFAULT_MAX_SEGMENT_LENGTH, STREAM_MIN_CHARS, STREAM_SENTIMENT_MIN_CHARS};
use crate::echo::EchoPatternEngine;
use crate::entropy::{self, EntropyHeatmap, NarrativeEntropyScanner};
use crate::error::Result;
use crate::fractal::FractalDriftDetector;
use crate::lexicon::Lexicons;
use crate::observer::{ObserverSimulation, SentimentModel};
use crate::result::{
    AnalysisResult, FieldClassification, StreamMetrics, StreamResult, StreamStatus, field_score,
};
use crate::symbolic::SymbolicDensityAnalyzer;
use crate::text::{Segment, prepare_segments, preprocess};
use crate::time;

/// Engine settings. Every field has a default, so partial TOML files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_segment_length: usize,
    /// Analyzers to run, in order.
    pub modules: Vec<ModuleKind>,
    /// Seed for the observer's generator; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Request sentiment shifts. Takes effect only when a model is supplied.
    pub sentiment_available: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            modules: ModuleKind::ALL.to_vec(),
            seed: None,
            sentiment_available: false,
        }
    }
}

impl EngineConfig {
    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }
}

pub struct FieldDistortionEngine {
    config: EngineConfig,
    annotator: Arc<dyn Annotator>,
    lexicons: Arc<Lexicons>,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl FieldDistortionEngine {
    /// Engine with the built-in annotator and no sentiment model.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_providers(config, Arc::new(HeuristicAnnotator::new()), None)
    }

    pub fn with_providers(
        config: EngineConfig,
        annotator: Arc<dyn Annotator>,
        sentiment: Option<Box<dyn SentimentModel>>,
    ) -> Self {
        let lexicons = Lexicons::standard();
        let mut sentiment = if config.sentiment_available {
            if sentiment.is_none() {
                warn!("sentiment requested but no sentiment model was supplied");
            }
            sentiment
        } else {
            None
        };

        let mut analyzers: Vec<Box<dyn Analyzer>> = Vec::with_capacity(config.modules.len());
        for kind in &config.modules {
            let analyzer: Box<dyn Analyzer> = match kind {
                ModuleKind::Drift => Box::new(FractalDriftDetector::new(Arc::clone(&lexicons))),
                ModuleKind::Entropy => {
                    Box::new(NarrativeEntropyScanner::new(Arc::clone(&annotator)))
                }
                ModuleKind::Symbolic => {
                    Box::new(SymbolicDensityAnalyzer::new(Arc::clone(&lexicons)))
                }
                ModuleKind::Echo => Box::new(EchoPatternEngine::new()),
                ModuleKind::Observer => {
                    let mut observer = ObserverSimulation::new(Arc::clone(&lexicons), config.rng());
                    if let Some(model) = sentiment.take() {
                        observer = observer.with_sentiment(model);
                    }
                    Box::new(observer)
                }
            };
            analyzers.push(analyzer);
        }

        Self {
            config,
            annotator,
            lexicons,
            analyzers,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn annotate(&self, segments: &[Segment]) -> Result<Vec<Document>> {
        segments
            .iter()
            .map(|s| {
                self.annotator.annotate(s).inspect_err(|e| {
                    warn!(segment = s.index, error = %e, "annotation failed");
                })
            })
            .collect()
    }

    /// Run every configured analyzer over `text`.
    pub fn analyze(&mut self, text: &str) -> Result<AnalysisResult> {
        info!(chars = text.chars().count(), "starting analysis");
        let segments = prepare_segments(text, self.config.max_segment_length)?;
        let docs = self.annotate(&segments)?;

        let mut result = AnalysisResult::new(&segments);
        for analyzer in &mut self.analyzers {
            debug!(module = %analyzer.kind(), "running analyzer");
            result.insert(analyzer.analyze(&docs));
        }

        info!(segments = result.num_segments, "analysis complete");
        Ok(result)
    }

    /// Per-word character entropy grid for rendering.
    pub fn entropy_heatmap(&self, text: &str) -> Result<EntropyHeatmap> {
        let segments = prepare_segments(text, self.config.max_segment_length)?;
        let docs = self.annotate(&segments)?;
        Ok(entropy::entropy_heatmap(&docs))
    }

    /// Quick single-segment reading of a live buffer.
    pub fn analyze_stream(&self, buffer: &str) -> Result<StreamResult> {
        let text = preprocess(buffer);
        let text_length = text.chars().count();
        if text_length < STREAM_MIN_CHARS {
            return Ok(StreamResult::insufficient("Need more text for analysis"));
        }

        let segment = Segment { index: 0, text };
        let docs = vec![self.annotator.annotate(&segment)?];

        let entropy = NarrativeEntropyScanner::new(Arc::clone(&self.annotator))
            .scan(&docs)
            .mean_entropy;
        let symbolic_density = SymbolicDensityAnalyzer::new(Arc::clone(&self.lexicons))
            .measure(&docs)
            .mean_density;
        let sentiment = if text_length > STREAM_SENTIMENT_MIN_CHARS {
            ObserverSimulation::new(Arc::clone(&self.lexicons), self.config.rng())
                .simulate(&docs)
                .mean_resonance()
        } else {
            0.0
        };

        let entropy_score = field_score(entropy, symbolic_density, sentiment);
        debug!(entropy_score, "stream analysis complete");

        Ok(StreamResult {
            status: StreamStatus::Success,
            message: None,
            metrics: StreamMetrics {
                entropy,
                symbolic_density,
                sentiment,
                text_length,
                word_count: docs[0].len(),
                entropy_score,
            },
            classification: Some(FieldClassification::from_score(entropy_score)),
            timestamp: Some(time::now_iso8601()),
        })
    }
}

impl Default for FieldDistortionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
