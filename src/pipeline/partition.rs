use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::score::ScoredTable;
use crate::classification::{Label, LabelNames};
use crate::error::{PipelineError, PipelineResult};
use crate::table::{TableFormat, write_table};

/// 2つの出力先。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTargets {
    pub target: PathBuf,
    pub other: PathBuf,
}

impl OutputTargets {
    #[must_use]
    pub fn path(&self, label: Label) -> &Path {
        match label {
            Label::Target => &self.target,
            Label::Other => &self.other,
        }
    }
}

/// 振り分け結果の件数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSummary {
    pub target: usize,
    pub other: usize,
}

impl PartitionSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.target + self.other
    }
}

/// 判定結果をラベルごとに2つの表へ書き出すステージ。
#[derive(Debug, Clone)]
pub struct Partitioner {
    outputs: OutputTargets,
    names: LabelNames,
    label_column: String,
}

impl Partitioner {
    #[must_use]
    pub fn new(outputs: OutputTargets, names: LabelNames, label_column: impl Into<String>) -> Self {
        Self {
            outputs,
            names,
            label_column: label_column.into(),
        }
    }

    /// 両グループを一時ファイルに書き切ってから、最終パスへ rename する。
    /// 2つ目の rename に失敗した場合は、置いたばかりの1つ目も消す。
    ///
    /// # Errors
    /// どちらかの書き込み・rename に失敗した場合、そのグループを示す `OutputWrite`。
    pub fn partition(&self, scored: &ScoredTable) -> PipelineResult<PartitionSummary> {
        let mut headers = scored.headers.clone();
        headers.push(self.label_column.clone());

        let target = self.stage(scored, &headers, Label::Target)?;
        let other = self.stage(scored, &headers, Label::Other)?;
        let summary = PartitionSummary {
            target: target.rows,
            other: other.rows,
        };
        debug_assert_eq!(summary.total(), scored.records.len());

        target.commit()?;
        if let Err(error) = other.commit() {
            if let Err(cleanup) = fs::remove_file(&self.outputs.target) {
                warn!(
                    path = %self.outputs.target.display(),
                    error = %cleanup,
                    "failed to remove target output after the other group failed"
                );
            }
            return Err(error);
        }

        info!(
            source = %scored.source.display(),
            target_rows = summary.target,
            other_rows = summary.other,
            target_output = %self.outputs.target.display(),
            other_output = %self.outputs.other.display(),
            "predictions partitioned"
        );
        Ok(summary)
    }

    fn stage(
        &self,
        scored: &ScoredTable,
        headers: &[String],
        group: Label,
    ) -> PipelineResult<StagedOutput> {
        let path = self.outputs.path(group);
        let write_error = |source: io::Error| PipelineError::OutputWrite {
            group,
            path: path.to_path_buf(),
            source,
        };

        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;

        let label_name = self.names.name(group);
        let members: Vec<_> = scored
            .records
            .iter()
            .filter(|scored| scored.label == group)
            .collect();
        let rows = members.iter().map(|scored| {
            scored
                .record
                .fields
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(label_name))
        });

        let sink = BufWriter::new(staged.as_file_mut());
        write_table(sink, TableFormat::from_path_or_csv(path), headers, rows)
            .and_then(|writer| writer.into_inner().map_err(io::IntoInnerError::into_error))
            .map_err(write_error)?;
        staged.as_file().sync_all().map_err(write_error)?;

        Ok(StagedOutput {
            group,
            path: path.to_path_buf(),
            file: staged,
            rows: members.len(),
        })
    }
}

/// 書き込み済みで、まだ最終パスに置かれていない出力。
struct StagedOutput {
    group: Label,
    path: PathBuf,
    file: NamedTempFile,
    rows: usize,
}

impl StagedOutput {
    fn commit(self) -> PipelineResult<()> {
        let Self {
            group, path, file, ..
        } = self;
        file.persist(&path)
            .map_err(|e| PipelineError::OutputWrite {
                group,
                path,
                source: e.error,
            })?;
        Ok(())
    }
}
