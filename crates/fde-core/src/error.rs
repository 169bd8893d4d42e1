use std::fmt;

/// Failures surfaced by the analysis pipeline.
///
/// Only `EmptyInput` and `AnnotationUnavailable` ever escape `analyze()`.
/// `Vectorization` and `ContextSimilarity` are recovered inside the module
/// that raised them.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    EmptyInput,
    Vectorization(String),
    AnnotationUnavailable { segment_index: usize, reason: String },
    ContextSimilarity,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyInput => write!(f, "No segments found in the text."),
            AnalysisError::Vectorization(msg) => write!(f, "vectorization failed: {msg}"),
            AnalysisError::AnnotationUnavailable {
                segment_index,
                reason,
            } => write!(f, "annotation unavailable for segment {segment_index}: {reason}"),
            AnalysisError::ContextSimilarity => {
                write!(f, "context similarity could not be computed")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AnalysisError::EmptyInput.to_string(),
            "No segments found in the text."
        );
        let err = AnalysisError::AnnotationUnavailable {
            segment_index: 2,
            reason: "offline".into(),
        };
        assert_eq!(err.to_string(), "annotation unavailable for segment 2: offline");
    }
}
