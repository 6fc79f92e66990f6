use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::classification::{FeatureVector, Label, NoveltyClassifier};
use crate::error::{PipelineError, PipelineResult};
use crate::table::{RawRecord, TableFormat, TextColumn, read_table};

/// 判定済みの1行。
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: RawRecord,
    pub label: Label,
    pub score: f64,
    pub features: FeatureVector,
}

/// 評価表全体の判定結果。行順は入力のまま。
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTable {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub records: Vec<ScoredRecord>,
}

impl ScoredTable {
    #[must_use]
    pub fn count(&self, label: Label) -> usize {
        self.records.iter().filter(|r| r.label == label).count()
    }
}

/// 評価表を読み込み、凍結済みの分類器で全行を判定するステージ。
#[derive(Debug, Clone)]
pub struct Scorer {
    text_column: String,
    label_column: String,
}

impl Scorer {
    #[must_use]
    pub fn new(text_column: impl Into<String>, label_column: impl Into<String>) -> Self {
        Self {
            text_column: text_column.into(),
            label_column: label_column.into(),
        }
    }

    /// # Errors
    /// 評価表が読めない、テキスト列が無い、ラベル列と同名の列がある場合は `EvaluationRead`。
    pub fn score(
        &self,
        path: &Path,
        classifier: &NoveltyClassifier,
    ) -> PipelineResult<ScoredTable> {
        let evaluation_error = |reason: String| PipelineError::EvaluationRead {
            path: path.to_path_buf(),
            reason,
        };
        let table = read_table(path, TableFormat::from_path_or_csv(path))
            .map_err(|e| evaluation_error(e.to_string()))?;
        let column = TextColumn::resolve(&table.headers, &self.text_column)
            .map_err(|e| evaluation_error(e.to_string()))?;
        if table.headers.iter().any(|h| h == &self.label_column) {
            return Err(evaluation_error(format!(
                "column '{}' already exists and would be overwritten by predictions",
                self.label_column
            )));
        }

        let records: Vec<ScoredRecord> = table
            .records
            .into_par_iter()
            .map(|record| {
                // Missing text scores as an empty document.
                let text = record.text(&column).unwrap_or_default();
                let (label, score, features) = classifier.predict(text);
                ScoredRecord {
                    record,
                    label,
                    score,
                    features,
                }
            })
            .collect();

        let scored = ScoredTable {
            source: path.to_path_buf(),
            headers: table.headers,
            records,
        };
        // Rows with no known term all share the score of the empty document.
        let without_known_terms = scored
            .records
            .iter()
            .filter(|r| r.features.is_zero())
            .count();
        info!(
            path = %path.display(),
            rows = scored.records.len(),
            target_rows = scored.count(Label::Target),
            other_rows = scored.count(Label::Other),
            without_known_terms,
            "evaluation table scored"
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{BoundaryParams, DecisionBoundary, Vectorizer};
    use std::fs;

    fn classifier() -> NoveltyClassifier {
        let docs = vec!["standard outsourcing agreement".to_string(); 20];
        let vectorizer = Vectorizer::fit(&docs, 10).unwrap();
        let points = vectorizer.transform_all(&docs);
        let boundary = DecisionBoundary::train(&points, &BoundaryParams::default()).unwrap();
        NoveltyClassifier::new(vectorizer, boundary)
    }

    #[test]
    fn every_row_is_scored_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.csv");
        fs::write(
            &path,
            "id,description\n1,Standard outsourcing agreement\n2,\n3,quarterly weather report\n",
        )
        .unwrap();

        let scored = Scorer::new("description", "predicted_label")
            .score(&path, &classifier())
            .unwrap();
        let labels: Vec<Label> = scored.records.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec![Label::Target, Label::Other, Label::Other]);
        assert_eq!(scored.records[0].record.fields[0], "1");
        assert!(scored.records[1].features.is_zero());
    }

    #[test]
    fn missing_text_column_is_an_evaluation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.csv");
        fs::write(&path, "id,title\n1,x\n").unwrap();
        let error = Scorer::new("description", "predicted_label")
            .score(&path, &classifier())
            .unwrap_err();
        assert!(matches!(error, PipelineError::EvaluationRead { .. }));
    }

    #[test]
    fn existing_label_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.csv");
        fs::write(&path, "description,predicted_label\nx,ITO\n").unwrap();
        let error = Scorer::new("description", "predicted_label")
            .score(&path, &classifier())
            .unwrap_err();
        assert!(error.to_string().contains("predicted_label"));
    }

    #[test]
    fn unreadable_file_is_an_evaluation_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = Scorer::new("description", "predicted_label")
            .score(&dir.path().join("missing.csv"), &classifier())
            .unwrap_err();
        assert!(matches!(error, PipelineError::EvaluationRead { .. }));
    }
}
