//! パイプライン全体のエラー分類。
use std::path::PathBuf;

use thiserror::Error;

use crate::classification::Label;

/// バッチ実行中に発生するエラー。
///
/// `SourceRead` だけがコレクタ内で回復され、それ以外はすべて実行を中断する。
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read source {path}: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    #[error("no usable text collected under {root}")]
    EmptyCorpus { root: PathBuf },

    #[error("all {failed} tabular sources under {root} failed to load")]
    AllSourcesFailed { root: PathBuf, failed: usize },

    #[error("failed to read evaluation file {path}: {reason}")]
    EvaluationRead { path: PathBuf, reason: String },

    #[error("failed to write {group} predictions to {path}: {source}")]
    OutputWrite {
        group: Label,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("model artifact {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
