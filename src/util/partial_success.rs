//! ソース単位の部分成功ハンドリング。
use std::path::PathBuf;

/// 1ファイル分の読み込み結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Loaded { path: PathBuf, documents: usize },
    Skipped { path: PathBuf, reason: String },
}

/// コーパス収集の集計結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub loaded: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub documents: usize,
}

impl CollectionReport {
    /// ファイルごとの結果を走査順のまま集計する。
    #[must_use]
    pub fn from_outcomes(outcomes: &[SourceOutcome]) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome {
                SourceOutcome::Loaded { path, documents } => {
                    report.loaded.push(path.clone());
                    report.documents += documents;
                }
                SourceOutcome::Skipped { path, reason } => {
                    report.skipped.push((path.clone(), reason.clone()));
                }
            }
        }
        report
    }

    /// 表形式ファイルが1つ以上見つかり、そのすべてが読み込みに失敗したかどうか。
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.loaded.is_empty() && !self.skipped.is_empty()
    }

    /// すべて成功したかどうか。
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
