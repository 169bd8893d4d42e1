//! Integration tests exercising the full pipeline:
//! preprocess → segment → annotate → analyzers → summary/export.

use fde_core::{
    AnalysisError, EngineConfig, FieldClassification, FieldDistortionEngine, ModuleKind,
    StreamStatus, export_json, import_json,
};

fn engine(max_segment_length: usize) -> FieldDistortionEngine {
    FieldDistortionEngine::new(EngineConfig {
        max_segment_length,
        seed: Some(42),
        ..Default::default()
    })
}

const SHORT_TEXT: &str = "The quiet harbour sleeps under a pale morning sky.";

const SAILORS: &str = "Sailors mend torn nets beside crooked wooden piers while \
the silver bird returns home across grey northern waters tonight.";
const ACCOUNTANTS: &str = "Accountants audit quarterly ledgers inside glass towers because \
the silver bird returns home before every fiscal deadline.";
const CHILDREN: &str = "Children paint bright murals on school walls whenever \
the silver bird returns home during warm summer festivals outside.";

const MIXED_TEXT: &str = "\
Nobody else understands you like I do. Our secret stays between us.\n\n\
The evidence shows the storm passed. The river keeps its secrets in the dark.\n\n\
I love you, I fear the cage, and the blood on the door is only rain.\n\n\
The river keeps its secrets in the dark, and the mirror remembers every word.";

/// Test 1: a short single-sentence input is one coherent, unflagged segment.
#[test]
fn short_input_single_segment() {
    assert_eq!(SHORT_TEXT.chars().count(), 50);
    let result = engine(1000).analyze(SHORT_TEXT).unwrap();

    assert_eq!(result.num_segments, 1);
    assert_eq!(result.segments, vec![SHORT_TEXT.to_string()]);

    let entropy = result.narrative_entropy.as_ref().unwrap();
    assert_eq!(entropy.semantic_coherence, vec![1.0]);
    assert!(entropy.high_entropy_segments.is_empty());
    assert!(entropy.entropy_gradient.is_empty());

    let echo = result.echo_patterns.as_ref().unwrap();
    assert_eq!(echo.echo_count, 0);
}

/// Test 2: one phrase echoed across three unrelated contexts shifts context.
#[test]
fn echo_across_contrasting_segments() {
    let text = format!("{SAILORS}\n\n{ACCOUNTANTS}\n\n{CHILDREN}");
    let result = engine(150).analyze(&text).unwrap();
    assert_eq!(result.num_segments, 3);

    let echo = result.echo_patterns.as_ref().unwrap();
    let pattern = echo
        .echo_patterns
        .iter()
        .find(|p| p.phrase == "the silver bird returns home")
        .expect("five-word echo detected");
    assert_eq!(pattern.count, 3);
    assert!(!pattern.context_shifts.is_empty());
    let segments: Vec<usize> = pattern.occurrences.iter().map(|o| o.segment_index).collect();
    assert_eq!(segments, vec![0, 1, 2]);
    assert!(pattern.intensity > 0.1);
}

/// Test 3: the same phrase in exactly two segments counts twice.
#[test]
fn echo_in_two_segments_counts_two() {
    let text = format!("{SAILORS}\n\n{ACCOUNTANTS}");
    let result = engine(150).analyze(&text).unwrap();
    assert_eq!(result.num_segments, 2);

    let echo = result.echo_patterns.as_ref().unwrap();
    let pattern = echo
        .echo_patterns
        .iter()
        .find(|p| p.phrase == "the silver bird returns home")
        .expect("echo detected");
    assert_eq!(pattern.count, 2);
    assert_eq!(echo.echo_intensity.len(), 2);
}

/// Test 4: seeded engines produce identical results.
#[test]
fn seeded_analysis_is_deterministic() {
    let a = engine(120).analyze(MIXED_TEXT).unwrap();
    let b = engine(120).analyze(MIXED_TEXT).unwrap();
    assert_eq!(a, b);

    let observer = a.observer_simulation.as_ref().unwrap();
    assert_eq!(observer.observer_responses.len(), 3);
    assert_eq!(observer.resonance_scores.len(), 3);
}

/// Test 5: every module reports over the same segments.
#[test]
fn modules_share_segmentation() {
    let result = engine(120).analyze(MIXED_TEXT).unwrap();
    let n = result.num_segments;
    assert!(n >= 4);

    let entropy = result.narrative_entropy.as_ref().unwrap();
    assert_eq!(entropy.entropy_values.len(), n);
    assert_eq!(entropy.entropy_gradient.len(), n - 1);

    let symbolic = result.symbolic_density.as_ref().unwrap();
    assert_eq!(symbolic.symbol_density.len(), n);

    let echo = result.echo_patterns.as_ref().unwrap();
    assert_eq!(echo.echo_intensity.len(), n);

    let drift = result.fractal_drift.as_ref().unwrap();
    assert!(drift.error.is_none());
    assert_eq!(drift.drift_vectors.len(), n - 1);
    assert!(drift.narrative_stability.is_finite());
    assert!(drift.narrative_stability <= 1.0);
}

/// Test 6: the summary classification agrees with the field score bands.
#[test]
fn summary_classification_bands() {
    assert_eq!(FieldClassification::from_score(0.4), FieldClassification::Stable);
    assert_eq!(FieldClassification::from_score(0.41), FieldClassification::Distorted);
    assert_eq!(FieldClassification::from_score(0.7), FieldClassification::Distorted);
    assert_eq!(FieldClassification::from_score(0.71), FieldClassification::Collapsed);

    let result = engine(120).analyze(MIXED_TEXT).unwrap();
    let summary = result.summary();
    assert_eq!(
        summary.classification,
        FieldClassification::from_score(result.field_score())
    );
    assert_eq!(summary.num_segments, result.num_segments);
    assert_eq!(
        summary.summary,
        summary.classification.guidelines().join("\n")
    );
}

/// Test 7: export → import keeps the segments and every module's shape.
#[test]
fn export_import_roundtrip() {
    let result = engine(120).analyze(MIXED_TEXT).unwrap();
    let json = export_json(&result).unwrap();
    let restored = import_json(&json).unwrap();

    assert_eq!(restored.num_segments, result.num_segments);
    assert_eq!(restored.segments, result.segments);
    assert_eq!(
        restored.echo_patterns.as_ref().unwrap().echo_count,
        result.echo_patterns.as_ref().unwrap().echo_count
    );
    assert_eq!(
        restored.symbolic_density.as_ref().unwrap().grooming_patterns.len(),
        result.symbolic_density.as_ref().unwrap().grooming_patterns.len()
    );
}

/// Test 8: a module subset leaves the rest absent from the export.
#[test]
fn subset_export_omits_missing_modules() {
    let mut engine = FieldDistortionEngine::new(EngineConfig {
        modules: vec![ModuleKind::Entropy, ModuleKind::Echo],
        seed: Some(42),
        ..Default::default()
    });
    let result = engine.analyze(MIXED_TEXT).unwrap();
    let value: serde_json::Value = serde_json::from_str(&export_json(&result).unwrap()).unwrap();
    let body = &value["result"];
    assert!(body.get("narrative_entropy").is_some());
    assert!(body.get("echo_patterns").is_some());
    assert!(body.get("fractal_drift").is_none());
    assert!(body.get("observer_simulation").is_none());
}

/// Test 9: whitespace-only input is rejected before any analyzer runs.
#[test]
fn blank_input_rejected() {
    assert_eq!(
        engine(1000).analyze("\n\n   \t ").unwrap_err(),
        AnalysisError::EmptyInput
    );
}

/// Test 10: stream mode on a live buffer.
#[test]
fn stream_buffer_lifecycle() {
    let engine = engine(1000);
    let early = engine.analyze_stream("I love").unwrap();
    assert_eq!(early.status, StreamStatus::InsufficientData);

    let later = engine
        .analyze_stream("I love you and nobody else understands you like I do.")
        .unwrap();
    assert_eq!(later.status, StreamStatus::Success);
    assert!(later.metrics.text_length > 30);
    assert!(later.classification.is_some());
}
