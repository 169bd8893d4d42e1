//! Aggregated analysis output, its persisted summary, and stream results.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyzer::ModuleReport;
use crate::constants::{
    DISTORTED_FIELD_MAX, STABLE_FIELD_MAX, STREAM_DENSITY_WEIGHT, STREAM_ENTROPY_WEIGHT,
    STREAM_SENTIMENT_WEIGHT,
};
use crate::echo::EchoReport;
use crate::entropy::EntropyReport;
use crate::fractal::FractalReport;
use crate::observer::ObserverReport;
use crate::symbolic::SymbolicReport;
use crate::text::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldClassification {
    #[serde(rename = "Stable Field")]
    Stable,
    #[serde(rename = "Distorted Field")]
    Distorted,
    #[serde(rename = "Collapsed Field")]
    Collapsed,
}

impl FieldClassification {
    /// Upper bounds are inclusive: 0.4 is still stable, 0.7 still distorted.
    pub fn from_score(score: f64) -> Self {
        if score > DISTORTED_FIELD_MAX {
            FieldClassification::Collapsed
        } else if score > STABLE_FIELD_MAX {
            FieldClassification::Distorted
        } else {
            FieldClassification::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldClassification::Stable => "Stable Field",
            FieldClassification::Distorted => "Distorted Field",
            FieldClassification::Collapsed => "Collapsed Field",
        }
    }

    /// Reading notes shown alongside a classification.
    pub fn guidelines(self) -> &'static [&'static str] {
        match self {
            FieldClassification::Stable => &[
                "Narrative appears coherent with minimal distortion",
                "Low risk of emotional manipulation or narrative warping",
                "Standard communication patterns detected",
            ],
            FieldClassification::Distorted => &[
                "Moderate narrative distortion detected",
                "Potential emotional manipulation present",
                "Recommend closer analysis of high-entropy segments",
            ],
            FieldClassification::Collapsed => &[
                "Severe narrative distortion detected",
                "High probability of emotional manipulation",
                "Recursive language patterns suggest coercive intent",
                "ALERT: Narrative exhibits signs of trauma-based manipulation",
            ],
        }
    }
}

impl fmt::Display for FieldClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted field score shared by stream mode and full-analysis summaries.
pub fn field_score(entropy: f64, density: f64, sentiment: f64) -> f64 {
    STREAM_ENTROPY_WEIGHT * entropy + STREAM_DENSITY_WEIGHT * density + STREAM_SENTIMENT_WEIGHT * sentiment.abs()
}

/// Everything one `analyze()` call produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fractal_drift: Option<FractalReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_entropy: Option<EntropyReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbolic_density: Option<SymbolicReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_patterns: Option<EchoReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer_simulation: Option<ObserverReport>,
    pub num_segments: usize,
    pub segments: Vec<String>,
}

impl AnalysisResult {
    pub fn new(segments: &[Segment]) -> Self {
        Self {
            num_segments: segments.len(),
            segments: segments.iter().map(|s| s.text.clone()).collect(),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, report: ModuleReport) {
        match report {
            ModuleReport::Drift(r) => self.fractal_drift = Some(r),
            ModuleReport::Entropy(r) => self.narrative_entropy = Some(r),
            ModuleReport::Symbolic(r) => self.symbolic_density = Some(r),
            ModuleReport::Echo(r) => self.echo_patterns = Some(r),
            ModuleReport::Observer(r) => self.observer_simulation = Some(r),
        }
    }

    pub fn mean_entropy(&self) -> f64 {
        self.narrative_entropy.as_ref().map_or(0.0, |r| r.mean_entropy)
    }

    pub fn mean_density(&self) -> f64 {
        self.symbolic_density.as_ref().map_or(0.0, |r| r.mean_density)
    }

    pub fn mean_resonance(&self) -> f64 {
        self.observer_simulation
            .as_ref()
            .map_or(0.0, ObserverReport::mean_resonance)
    }

    pub fn field_score(&self) -> f64 {
        field_score(self.mean_entropy(), self.mean_density(), self.mean_resonance())
    }

    pub fn summary(&self) -> AnalysisSummary {
        let classification = FieldClassification::from_score(self.field_score());
        AnalysisSummary {
            classification,
            entropy_score: self.mean_entropy(),
            fractal_recursion_score: self
                .fractal_drift
                .as_ref()
                .map_or(0.0, |r| r.recursion_score),
            symbol_density: self.mean_density(),
            echo_intensity: self.echo_patterns.as_ref().map_or(0.0, |r| r.mean_intensity),
            num_segments: self.num_segments,
            summary: classification.guidelines().join("\n"),
        }
    }

    /// Data artifacts a renderer should draw into `dir`. Modules that did not
    /// run contribute nothing.
    pub fn render_plan(&self, dir: &Path) -> RenderPlan {
        let mut artifacts = Vec::new();
        if let Some(entropy) = &self.narrative_entropy {
            artifacts.push(RenderArtifact::new(
                dir,
                ArtifactKind::EntropyHeatmap,
                serde_json::json!({ "entropy_values": entropy.entropy_values }),
            ));
        }
        if let Some(fractal) = &self.fractal_drift {
            artifacts.push(RenderArtifact::new(
                dir,
                ArtifactKind::DriftDiagram,
                serde_json::json!({ "drift_vectors": fractal.drift_vectors }),
            ));
            artifacts.push(RenderArtifact::new(
                dir,
                ArtifactKind::FractalSignatures,
                serde_json::json!({ "fractal_signatures": fractal.fractal_signatures }),
            ));
        }
        RenderPlan { artifacts }
    }
}

/// The subset of a result handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub classification: FieldClassification,
    pub entropy_score: f64,
    pub fractal_recursion_score: f64,
    pub symbol_density: f64,
    pub echo_intensity: f64,
    pub num_segments: usize,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    EntropyHeatmap,
    DriftDiagram,
    FractalSignatures,
}

impl ArtifactKind {
    pub fn file_stem(self) -> &'static str {
        match self {
            ArtifactKind::EntropyHeatmap => "entropy_heatmap",
            ArtifactKind::DriftDiagram => "drift_diagram",
            ArtifactKind::FractalSignatures => "fractal_signatures",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub data: serde_json::Value,
}

impl RenderArtifact {
    fn new(dir: &Path, kind: ArtifactKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            path: dir.join(format!("{}.json", kind.file_stem())),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderPlan {
    pub artifacts: Vec<RenderArtifact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    Success,
    InsufficientData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMetrics {
    pub entropy: f64,
    pub symbolic_density: f64,
    pub sentiment: f64,
    pub text_length: usize,
    pub word_count: usize,
    pub entropy_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamResult {
    pub status: StreamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metrics: StreamMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<FieldClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StreamResult {
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self {
            status: StreamStatus::InsufficientData,
            message: Some(message.into()),
            metrics: StreamMetrics::default(),
            classification: None,
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(FieldClassification::from_score(0.0), FieldClassification::Stable);
        assert_eq!(FieldClassification::from_score(0.4), FieldClassification::Stable);
        assert_eq!(FieldClassification::from_score(0.400001), FieldClassification::Distorted);
        assert_eq!(FieldClassification::from_score(0.7), FieldClassification::Distorted);
        assert_eq!(FieldClassification::from_score(0.700001), FieldClassification::Collapsed);
    }

    #[test]
    fn test_classification_serializes_as_label() {
        let json = serde_json::to_string(&FieldClassification::Collapsed).unwrap();
        assert_eq!(json, "\"Collapsed Field\"");
    }

    #[test]
    fn test_field_score_uses_absolute_sentiment() {
        assert_eq!(field_score(1.0, 1.0, -1.0), field_score(1.0, 1.0, 1.0));
        assert!((field_score(0.2, 0.5, 0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_render_plan_skips_missing_modules() {
        let mut result = AnalysisResult::default();
        assert!(result.render_plan(Path::new("out")).artifacts.is_empty());

        result.insert(ModuleReport::Drift(FractalReport::default()));
        let plan = result.render_plan(Path::new("out"));
        let paths: Vec<_> = plan.artifacts.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/drift_diagram.json"),
                PathBuf::from("out/fractal_signatures.json"),
            ]
        );
    }

    #[test]
    fn test_insufficient_stream_result_shape() {
        let r = StreamResult::insufficient("Not enough text to analyze");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["metrics"]["word_count"], 0);
        assert!(json.get("classification").is_none());
    }

    #[test]
    fn test_summary_of_empty_result_is_stable() {
        let s = AnalysisResult::default().summary();
        assert_eq!(s.classification, FieldClassification::Stable);
        assert_eq!(s.num_segments, 0);
        assert!(s.summary.starts_with("Narrative appears coherent"));
    }
}
