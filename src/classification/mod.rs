//! 一クラス分類（新規性検出）のための高水準API。
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod artifact;
pub mod features;
pub mod kernel;
pub mod model;
pub mod stop_words;
pub mod tokenizer;

pub use artifact::ModelArtifact;
pub use features::{FeatureVector, Vectorizer, Vocabulary};
pub use kernel::Kernel;
pub use model::{BoundaryParams, DecisionBoundary, KernelKind};

/// 予測ラベル。判定値が 0 以上なら `Target`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Target,
    Other,
}

impl Label {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.0 { Self::Target } else { Self::Other }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => f.write_str("target"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// 出力ファイルに書き込むラベル名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelNames {
    pub target: String,
    pub other: String,
}

impl Default for LabelNames {
    fn default() -> Self {
        Self {
            target: "ITO".to_string(),
            other: "Non-ITO".to_string(),
        }
    }
}

impl LabelNames {
    #[must_use]
    pub fn name(&self, label: Label) -> &str {
        match label {
            Label::Target => &self.target,
            Label::Other => &self.other,
        }
    }
}

/// 凍結済みの特徴抽出器と判定境界の組。スコアリング段に読み取り専用で渡される。
#[derive(Debug, Clone)]
pub struct NoveltyClassifier {
    vectorizer: Vectorizer,
    boundary: DecisionBoundary,
}

impl NoveltyClassifier {
    #[must_use]
    pub fn new(vectorizer: Vectorizer, boundary: DecisionBoundary) -> Self {
        Self {
            vectorizer,
            boundary,
        }
    }

    /// テキストを特徴化して判定する。
    #[must_use]
    pub fn predict(&self, text: &str) -> (Label, f64, FeatureVector) {
        let features = self.vectorizer.transform(text);
        let score = self.boundary.score(&features);
        (Label::from_score(score), score, features)
    }

    #[must_use]
    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    #[must_use]
    pub fn boundary(&self) -> &DecisionBoundary {
        &self.boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_score_is_target() {
        assert_eq!(Label::from_score(0.0), Label::Target);
        assert_eq!(Label::from_score(-1e-15), Label::Other);
        assert_eq!(Label::from_score(0.3), Label::Target);
    }

    #[test]
    fn default_label_names_follow_ito_convention() {
        let names = LabelNames::default();
        assert_eq!(names.name(Label::Target), "ITO");
        assert_eq!(names.name(Label::Other), "Non-ITO");
    }
}
