//! Versioned JSON envelope for analysis results.

use serde::{Deserialize, Serialize};

use crate::result::AnalysisResult;
use crate::time;

pub const CURRENT_VERSION: &str = "0.1.0";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportEnvelope {
    pub version: String,
    #[serde(default)]
    pub generated_at: String,
    pub result: AnalysisResult,
}

impl ReportEnvelope {
    pub fn wrap(result: AnalysisResult) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            generated_at: time::now_iso8601(),
            result,
        }
    }
}

pub fn export_json(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ReportEnvelope::wrap(result.clone()))
}

/// Accepts an envelope of any version; only the result is returned.
pub fn import_json(json: &str) -> Result<AnalysisResult, serde_json::Error> {
    let envelope: ReportEnvelope = serde_json::from_str(json)?;
    Ok(envelope.result)
}
