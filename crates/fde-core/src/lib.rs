//! Field Distortion Engine: narrative-instability analysis for text.
//!
//! Text is normalised, packed into segments, annotated once, and then read by
//! five independent analyzers (fractal drift, narrative entropy, symbolic
//! density, echo patterns, observer simulation). Their reports are combined
//! into a single field score and classification.
//!
//! Zero I/O. Persistence lives in `fde-store`, the command line in `fde-cli`.

pub mod analyzer;
pub mod annotation;
pub mod constants;
pub mod echo;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod fractal;
pub mod lexicon;
pub mod observer;
pub mod report;
pub mod result;
pub mod stats;
pub mod stopwords;
pub mod symbolic;
pub mod text;
pub mod time;
pub mod vector;

pub use analyzer::{Analyzer, ModuleKind, ModuleReport};
pub use annotation::{Annotator, Document, HeuristicAnnotator, PartOfSpeech, Token, lemmatize};
pub use echo::{EchoPattern, EchoPatternEngine, EchoReport};
pub use engine::{EngineConfig, FieldDistortionEngine};
pub use entropy::{EntropyHeatmap, EntropyReport, NarrativeEntropyScanner, entropy_heatmap};
pub use error::{AnalysisError, Result};
pub use fractal::{FractalDriftDetector, FractalReport};
pub use lexicon::{Lexicons, Persona, PersonaStyle, SymbolCategory};
pub use observer::{ObserverReport, ObserverSimulation, SentimentModel};
pub use report::{CURRENT_VERSION, ReportEnvelope, export_json, import_json};
pub use result::{
    AnalysisResult, AnalysisSummary, ArtifactKind, FieldClassification, RenderArtifact,
    RenderPlan, StreamMetrics, StreamResult, StreamStatus, field_score,
};
pub use symbolic::{SymbolicDensityAnalyzer, SymbolicReport};
pub use text::{Segment, prepare_segments, preprocess, segment_text, split_sentences};
pub use vector::{TfidfMatrix, TfidfVectorizer, context_similarity};
