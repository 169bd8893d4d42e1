use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fde_core::{AnalysisSummary, FieldClassification, time};

use crate::error::{Result, StoreError};
use crate::schema;

/// One persisted analysis: the input text plus its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub created_at: String,
    pub text: String,
    pub summary: AnalysisSummary,
}

pub struct Store {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "SELECT id, created_at, text, field_classification, entropy_score,
        fractal_recursion_score, symbol_density, echo_intensity, num_segments, summary
     FROM analyses";

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Save ---

    pub fn save_analysis(&self, text: &str, summary: &AnalysisSummary) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO analyses (id, created_at, text, field_classification, entropy_score,
                fractal_recursion_score, symbol_density, echo_intensity, num_segments, summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.to_string(),
                time::now_iso8601(),
                text,
                summary.classification.as_str(),
                summary.entropy_score,
                summary.fractal_recursion_score,
                summary.symbol_density,
                summary.echo_intensity,
                summary.num_segments as i64,
                summary.summary,
            ],
        )?;
        debug!(%id, classification = %summary.classification, "saved analysis");
        Ok(id)
    }

    // --- Load ---

    pub fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id.to_string()],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// Most recent analyses first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;
        let rows: Vec<RawRecord> = stmt
            .query_map([limit as i64], RawRecord::from_row)?
            .collect::<std::result::Result<_, _>>()?;
        rows.into_iter().map(RawRecord::into_record).collect()
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// Column values as stored, before id and classification are validated.
struct RawRecord {
    id: String,
    created_at: String,
    text: String,
    classification: String,
    entropy_score: f64,
    fractal_recursion_score: f64,
    symbol_density: f64,
    echo_intensity: f64,
    num_segments: i64,
    summary: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            text: row.get(2)?,
            classification: row.get(3)?,
            entropy_score: row.get(4)?,
            fractal_recursion_score: row.get(5)?,
            symbol_density: row.get(6)?,
            echo_intensity: row.get(7)?,
            num_segments: row.get(8)?,
            summary: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<AnalysisRecord> {
        Ok(AnalysisRecord {
            id: parse_uuid(&self.id)?,
            created_at: self.created_at,
            text: self.text,
            summary: AnalysisSummary {
                classification: parse_classification(&self.classification)?,
                entropy_score: self.entropy_score,
                fractal_recursion_score: self.fractal_recursion_score,
                symbol_density: self.symbol_density,
                echo_intensity: self.echo_intensity,
                num_segments: usize::try_from(self.num_segments).map_err(|_| {
                    StoreError::InvalidData(format!("negative segment count {}", self.num_segments))
                })?,
                summary: self.summary,
            },
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}

fn parse_classification(label: &str) -> Result<FieldClassification> {
    serde_json::from_value(serde_json::Value::String(label.to_string()))
        .map_err(|_| StoreError::InvalidData(format!("unknown classification '{label}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(classification: FieldClassification, entropy: f64) -> AnalysisSummary {
        AnalysisSummary {
            classification,
            entropy_score: entropy,
            fractal_recursion_score: 0.25,
            symbol_density: 0.125,
            echo_intensity: 1.5,
            num_segments: 3,
            summary: classification.guidelines().join("\n"),
        }
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let s = summary(FieldClassification::Distorted, 0.55);
        let id = store.save_analysis("some text", &s).unwrap();

        let record = store.get_analysis(id).unwrap().expect("record exists");
        assert_eq!(record.id, id);
        assert_eq!(record.text, "some text");
        assert_eq!(record.summary, s);
        assert!(record.created_at.ends_with('Z'));
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_analysis(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_recent_newest_first_with_limit() {
        let store = Store::open_in_memory().unwrap();
        let ids: Vec<Uuid> = (0..4)
            .map(|i| {
                store
                    .save_analysis(&format!("text {i}"), &summary(FieldClassification::Stable, 0.1))
                    .unwrap()
            })
            .collect();

        let recent = store.recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, ids[3]);
        assert_eq!(recent[2].id, ids[1]);
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn test_unknown_classification_is_invalid_data() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .save_analysis("x", &summary(FieldClassification::Collapsed, 0.9))
            .unwrap();
        store
            .conn()
            .execute(
                "UPDATE analyses SET field_classification = 'Wobbly Field' WHERE id = ?1",
                [id.to_string()],
            )
            .unwrap();
        let err = store.get_analysis(id).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)), "got {err}");
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyses.db");
        let id = {
            let store = Store::open(&path).unwrap();
            store
                .save_analysis("persisted", &summary(FieldClassification::Stable, 0.2))
                .unwrap()
        };
        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.get_analysis(id).unwrap().unwrap().text, "persisted");
    }
}
