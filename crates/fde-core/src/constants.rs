/// Default maximum segment length in characters.
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 1000;

// -- Fractal drift --

/// Terms present in more than this fraction of segments are pruned from the vocabulary.
pub const MAX_DOC_FREQ: f64 = 0.9;

/// Largest word n-gram used for segment vectors.
pub const MAX_TERM_NGRAM: usize = 3;

/// Positive and negative terms reported per drift step.
pub const DRIFT_TERMS: usize = 5;

/// Non-adjacent pairs above this similarity become fractal signatures.
pub const FRACTAL_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Common phrase length bounds (words) for fractal signatures.
pub const COMMON_PHRASE_MIN: usize = 4;
pub const COMMON_PHRASE_MAX: usize = 9;

/// Common phrases kept per fractal signature.
pub const COMMON_PHRASES_KEPT: usize = 5;

// -- Narrative entropy --

pub const LEXICAL_WEIGHT: f64 = 0.4;
pub const SYNTACTIC_WEIGHT: f64 = 0.4;
pub const INCOHERENCE_WEIGHT: f64 = 0.2;

/// Percentile above which a segment is flagged high-entropy.
pub const HIGH_ENTROPY_PERCENTILE: f64 = 75.0;

// -- Symbolic density --

/// Percentile above which a segment is an emotional blackhole.
pub const BLACKHOLE_PERCENTILE: f64 = 90.0;

/// Minimum symbols of one category to form a cluster.
pub const MIN_CLUSTER_SYMBOLS: usize = 3;

pub const TOP_SYMBOLS: usize = 20;

// -- Echo patterns --

pub const ECHO_MIN_NGRAM: usize = 3;
pub const ECHO_MAX_NGRAM: usize = 8;

/// Characters captured on each side of an echo occurrence.
pub const CONTEXT_RADIUS: usize = 50;

/// Similarity used when two contexts share no vocabulary.
pub const NEUTRAL_CONTEXT_SIMILARITY: f64 = 0.5;

/// Consecutive occurrences below this context similarity form a context shift.
pub const CONTEXT_SHIFT_THRESHOLD: f64 = 0.5;

/// Echoes at or below this intensity are discarded.
pub const ECHO_INTENSITY_THRESHOLD: f64 = 0.1;

pub const TOP_ECHOES: usize = 10;

// -- Observer simulation --

/// Segments sampled per persona.
pub const PERSONA_SAMPLES: usize = 3;

/// Emotional hit-rate multiplier before capping at 1.0.
pub const EMOTIONALITY_SCALE: f64 = 5.0;

/// Score used when no indicator of either kind is present.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Sentiment delta between consecutive segments that counts as a shift.
pub const SENTIMENT_SHIFT_THRESHOLD: f64 = 0.5;

/// Characters of each segment handed to the sentiment model.
pub const SENTIMENT_MAX_CHARS: usize = 512;

// -- Stream mode --

/// Buffers shorter than this (after normalization) are insufficient.
pub const STREAM_MIN_CHARS: usize = 10;

/// Buffers longer than this also get resonance-derived sentiment.
pub const STREAM_SENTIMENT_MIN_CHARS: usize = 30;

pub const STREAM_ENTROPY_WEIGHT: f64 = 0.5;
pub const STREAM_DENSITY_WEIGHT: f64 = 0.3;
pub const STREAM_SENTIMENT_WEIGHT: f64 = 0.2;

/// Field classification upper bounds (inclusive).
pub const STABLE_FIELD_MAX: f64 = 0.4;
pub const DISTORTED_FIELD_MAX: f64 = 0.7;
