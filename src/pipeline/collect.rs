use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};
use crate::table::{TableFormat, TextColumn, read_table};
use crate::util::partial_success::{CollectionReport, SourceOutcome};

/// 学習用コーパス。パスの昇順、ファイル内は行順に並ぶ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub root: PathBuf,
    pub documents: Vec<String>,
    pub report: CollectionReport,
}

impl Corpus {
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 学習に使えるテキストが無ければ致命的エラーにする。
    ///
    /// # Errors
    /// 見つかった表形式ファイルがすべて失敗した場合は `AllSourcesFailed`、
    /// それ以外でテキストが無い場合は `EmptyCorpus`。
    pub fn ensure_usable(self) -> PipelineResult<Self> {
        if self.report.all_failed() {
            return Err(PipelineError::AllSourcesFailed {
                root: self.root,
                failed: self.report.skipped.len(),
            });
        }
        if self.documents.is_empty() {
            return Err(PipelineError::EmptyCorpus { root: self.root });
        }
        Ok(self)
    }
}

/// ディレクトリ配下の CSV/TSV からテキスト列を集めるステージ。
#[derive(Debug, Clone)]
pub struct CorpusCollector {
    text_column: String,
}

impl CorpusCollector {
    #[must_use]
    pub fn new(text_column: impl Into<String>) -> Self {
        Self {
            text_column: text_column.into(),
        }
    }

    /// ルート配下を再帰的に走査してコーパスを組み立てる。
    ///
    /// 個々のファイルの失敗はスキップとして記録され、結果は空でありうる。
    #[must_use]
    pub fn collect(&self, root: &Path) -> Corpus {
        let candidates = discover_sources(root);
        debug!(root = %root.display(), candidates = candidates.len(), "tabular sources discovered");

        let loaded: Vec<(SourceOutcome, Vec<String>)> = candidates
            .into_par_iter()
            .map(|(path, format)| self.load_source(path, format))
            .collect();

        let mut documents = Vec::new();
        let mut outcomes = Vec::with_capacity(loaded.len());
        for (outcome, texts) in loaded {
            if let SourceOutcome::Skipped { path, reason } = &outcome {
                warn!(path = %path.display(), reason = %reason, "skipping source");
            }
            documents.extend(texts);
            outcomes.push(outcome);
        }

        let report = CollectionReport::from_outcomes(&outcomes);
        if report.is_complete() {
            info!(
                root = %root.display(),
                sources_loaded = report.loaded.len(),
                documents = documents.len(),
                "corpus collected"
            );
        } else {
            warn!(
                root = %root.display(),
                sources_loaded = report.loaded.len(),
                sources_skipped = report.skipped.len(),
                documents = documents.len(),
                "corpus collected with skipped sources"
            );
        }

        Corpus {
            root: root.to_path_buf(),
            documents,
            report,
        }
    }

    fn load_source(&self, path: PathBuf, format: TableFormat) -> (SourceOutcome, Vec<String>) {
        match self.read_texts(&path, format) {
            Ok(texts) => (
                SourceOutcome::Loaded {
                    path,
                    documents: texts.len(),
                },
                texts,
            ),
            Err(PipelineError::SourceRead { path, reason }) => {
                (SourceOutcome::Skipped { path, reason }, Vec::new())
            }
            Err(other) => (
                SourceOutcome::Skipped {
                    path,
                    reason: other.to_string(),
                },
                Vec::new(),
            ),
        }
    }

    fn read_texts(&self, path: &Path, format: TableFormat) -> PipelineResult<Vec<String>> {
        let source_error = |reason: String| PipelineError::SourceRead {
            path: path.to_path_buf(),
            reason,
        };
        let table = read_table(path, format).map_err(|e| source_error(e.to_string()))?;
        let column = TextColumn::resolve(&table.headers, &self.text_column)
            .map_err(|e| source_error(e.to_string()))?;
        Ok(table.texts(&column))
    }
}

/// 認識できる拡張子のファイルをパス順に列挙する。
fn discover_sources(root: &Path) -> Vec<(PathBuf, TableFormat)> {
    let mut candidates: Vec<(PathBuf, TableFormat)> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(path = ?error.path(), error = %error, "directory traversal error");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let format = TableFormat::from_path(entry.path())?;
            Some((entry.into_path(), format))
        })
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    candidates
}
