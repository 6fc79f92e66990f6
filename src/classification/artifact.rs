//! 学習済みモデル（語彙・IDF・判定境界）の JSON 保存と読み込み。
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{DecisionBoundary, NoveltyClassifier, Vectorizer};
use crate::error::{PipelineError, PipelineResult};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// 学習コーパスの xxh3 フィンガープリント（16 進）。
    pub corpus_fingerprint: String,
    pub training_documents: usize,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub boundary: DecisionBoundary,
}

impl ModelArtifact {
    #[must_use]
    pub fn from_classifier(
        classifier: &NoveltyClassifier,
        corpus_fingerprint: String,
        training_documents: usize,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            corpus_fingerprint,
            training_documents,
            vocabulary: classifier.vectorizer().vocabulary().terms().to_vec(),
            idf: classifier.vectorizer().idf().to_vec(),
            boundary: classifier.boundary().clone(),
        }
    }

    /// 成果物を検証し、推論用の分類器を組み立てる。
    ///
    /// # Errors
    /// バージョン不一致、語彙と IDF・境界の次元不整合の場合。
    pub fn into_classifier(self, path: &Path) -> PipelineResult<NoveltyClassifier> {
        let artifact_error = |reason: String| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason,
        };
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(artifact_error(format!(
                "unsupported format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                self.format_version
            )));
        }
        let vectorizer = Vectorizer::from_parts(self.vocabulary, self.idf)
            .map_err(|error| artifact_error(error.to_string()))?;
        self.boundary
            .validate_for_dim(vectorizer.dim())
            .map_err(|error| artifact_error(error.to_string()))?;
        Ok(NoveltyClassifier::new(vectorizer, self.boundary))
    }

    /// # Errors
    /// 書き込みやシリアライズに失敗した場合。
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let artifact_error = |reason: String| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason,
        };
        let json = serde_json::to_vec_pretty(self).map_err(|e| artifact_error(e.to_string()))?;
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| artifact_error(e.to_string()))?;
        staged
            .write_all(&json)
            .map_err(|e| artifact_error(e.to_string()))?;
        staged
            .persist(path)
            .map_err(|e| artifact_error(e.error.to_string()))?;
        info!(
            path = %path.display(),
            vocabulary_size = self.vocabulary.len(),
            support_vectors = self.boundary.support_vector_count(),
            "model artifact saved"
        );
        Ok(())
    }

    /// # Errors
    /// ファイルが読めない、JSON として不正な場合。
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason: format!("failed to parse artifact json: {e}"),
        })
    }
}
