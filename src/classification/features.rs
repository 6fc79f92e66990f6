//! トークン列から TF-IDF 特徴量を抽出する。
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use sprs::CsVec;

use super::tokenizer::tokenize;
use crate::error::{PipelineError, PipelineResult};

/// 語彙（トークン → 特徴インデックス）。`fit` 後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl Vocabulary {
    fn from_terms(terms: Vec<String>) -> PipelineResult<Self> {
        let mut index = FxHashMap::default();
        for (position, term) in terms.iter().enumerate() {
            if index.insert(term.clone(), position).is_some() {
                return Err(PipelineError::InvalidParameter(format!(
                    "duplicate vocabulary term: {term}"
                )));
            }
        }
        Ok(Self { terms, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// インデックス順のトークン列。
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// L2 正規化済みの疎ベクトル。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "SparseRepr", try_from = "SparseRepr")]
pub struct FeatureVector {
    inner: CsVec<f64>,
}

impl PartialEq for FeatureVector {
    fn eq(&self, other: &Self) -> bool {
        self.dim() == other.dim()
            && self.indices() == other.indices()
            && self.values() == other.values()
    }
}

#[derive(Serialize, Deserialize)]
struct SparseRepr {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl From<FeatureVector> for SparseRepr {
    fn from(vector: FeatureVector) -> Self {
        let (dim, indices, values) = (
            vector.inner.dim(),
            vector.inner.indices().to_vec(),
            vector.inner.data().to_vec(),
        );
        Self {
            dim,
            indices,
            values,
        }
    }
}

impl TryFrom<SparseRepr> for FeatureVector {
    type Error = String;

    fn try_from(repr: SparseRepr) -> Result<Self, Self::Error> {
        FeatureVector::from_parts(repr.dim, repr.indices, repr.values)
    }
}

impl FeatureVector {
    /// 次元 `dim` のゼロベクトル。
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            inner: CsVec::empty(dim),
        }
    }

    /// 外部から読み込んだ成分を検証してベクトルを組み立てる。
    ///
    /// # Errors
    /// インデックスが昇順でない、範囲外、長さ不一致、非有限値の場合。
    pub fn from_parts(dim: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self, String> {
        if indices.len() != values.len() {
            return Err(format!(
                "indices/values length mismatch: {} vs {}",
                indices.len(),
                values.len()
            ));
        }
        if indices.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("indices must be strictly increasing".to_string());
        }
        if indices.last().is_some_and(|&last| last >= dim) {
            return Err(format!("index out of range for dimension {dim}"));
        }
        if values.iter().any(|value| !value.is_finite()) {
            return Err("non-finite feature value".to_string());
        }
        Ok(Self {
            inner: CsVec::new(dim, indices, values),
        })
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.inner.dim()
    }

    /// 非ゼロ成分の数。
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.inner.nnz() == 0
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        self.inner.indices()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        self.inner.data()
    }

    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let (a_idx, a_val) = (self.indices(), self.values());
        let (b_idx, b_val) = (other.indices(), other.values());
        let (mut i, mut j) = (0, 0);
        let mut total = 0.0;
        while i < a_idx.len() && j < b_idx.len() {
            match a_idx[i].cmp(&b_idx[j]) {
                std::cmp::Ordering::Equal => {
                    total += a_val[i] * b_val[j];
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        total
    }

    /// 二乗ユークリッド距離。インデックスを併合して計算するため、同一ベクトル同士では厳密に 0 になる。
    #[must_use]
    pub fn squared_distance(&self, other: &Self) -> f64 {
        let (a_idx, a_val) = (self.indices(), self.values());
        let (b_idx, b_val) = (other.indices(), other.values());
        let (mut i, mut j) = (0, 0);
        let mut total = 0.0;
        while i < a_idx.len() && j < b_idx.len() {
            let diff = match a_idx[i].cmp(&b_idx[j]) {
                std::cmp::Ordering::Equal => {
                    let diff = a_val[i] - b_val[j];
                    i += 1;
                    j += 1;
                    diff
                }
                std::cmp::Ordering::Less => {
                    let diff = a_val[i];
                    i += 1;
                    diff
                }
                std::cmp::Ordering::Greater => {
                    let diff = b_val[j];
                    j += 1;
                    diff
                }
            };
            total += diff * diff;
        }
        total += a_val[i..].iter().map(|v| v * v).sum::<f64>();
        total += b_val[j..].iter().map(|v| v * v).sum::<f64>();
        total
    }

    #[must_use]
    pub fn l2_norm(&self) -> f64 {
        self.values().iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// 学習コーパスから構築した語彙と IDF。`transform` 時に凍結状態で再利用する。
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorizer {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
}

#[derive(Debug, Default)]
struct TermStats {
    first_seen: usize,
    doc_freq: usize,
    corpus_freq: usize,
}

impl Vectorizer {
    /// コーパスから語彙と IDF を構築する。
    ///
    /// 順位付けスコアは `corpus_freq * idf`、同点は最初に出現した順。
    ///
    /// # Errors
    /// 文書が 0 件、または `max_features` が 0 の場合。
    pub fn fit(documents: &[String], max_features: usize) -> PipelineResult<Self> {
        if max_features == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_features must be greater than 0".to_string(),
            ));
        }
        if documents.is_empty() {
            return Err(PipelineError::EmptyCorpus {
                root: std::path::PathBuf::new(),
            });
        }

        let mut stats: FxHashMap<String, TermStats> = FxHashMap::default();
        for document in documents {
            let tokens = tokenize(document);
            let mut seen_in_doc: FxHashSet<&str> = FxHashSet::default();
            for token in &tokens {
                let next_order = stats.len();
                let entry = stats.entry(token.clone()).or_insert_with(|| TermStats {
                    first_seen: next_order,
                    ..TermStats::default()
                });
                entry.corpus_freq += 1;
                if seen_in_doc.insert(token.as_str()) {
                    entry.doc_freq += 1;
                }
            }
        }

        let unique_tokens = stats.len();
        #[allow(clippy::cast_precision_loss)]
        let n = documents.len() as f64;
        let mut ranked: Vec<(String, TermStats, f64)> = stats
            .into_iter()
            .map(|(term, stat)| {
                #[allow(clippy::cast_precision_loss)]
                let idf = smooth_idf(n, stat.doc_freq as f64);
                (term, stat, idf)
            })
            .collect();
        ranked.sort_by(|a, b| {
            #[allow(clippy::cast_precision_loss)]
            let score_a = a.1.corpus_freq as f64 * a.2;
            #[allow(clippy::cast_precision_loss)]
            let score_b = b.1.corpus_freq as f64 * b.2;
            score_b
                .total_cmp(&score_a)
                .then_with(|| a.1.first_seen.cmp(&b.1.first_seen))
        });
        ranked.truncate(max_features);

        let idf: Vec<f64> = ranked.iter().map(|(_, _, idf)| *idf).collect();
        let terms: Vec<String> = ranked.into_iter().map(|(term, _, _)| term).collect();
        let vocabulary = Vocabulary::from_terms(terms)?;

        tracing::info!(
            total_docs = documents.len(),
            unique_tokens,
            selected_vocab_size = vocabulary.len(),
            "vectorizer fitted"
        );

        Ok(Self { vocabulary, idf })
    }

    /// 保存済みの語彙と IDF から復元する。
    ///
    /// # Errors
    /// 長さ不一致、重複語、非有限・非正の IDF の場合。
    pub fn from_parts(terms: Vec<String>, idf: Vec<f64>) -> PipelineResult<Self> {
        if terms.len() != idf.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "vocabulary/idf length mismatch: {} vs {}",
                terms.len(),
                idf.len()
            )));
        }
        if idf.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(PipelineError::InvalidParameter(
                "idf weights must be finite and positive".to_string(),
            ));
        }
        let vocabulary = Vocabulary::from_terms(terms)?;
        Ok(Self { vocabulary, idf })
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// 特徴ベクトルの次元（= 語彙サイズ）。
    #[must_use]
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    /// テキストを凍結済み語彙で特徴ベクトルに変換する。未知語は無視される。
    #[must_use]
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut counts: FxHashMap<usize, f64> = FxHashMap::default();
        for token in tokenize(text) {
            if let Some(index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        if counts.is_empty() {
            return FeatureVector::zeros(self.dim());
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        entries.sort_unstable_by_key(|(index, _)| *index);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        let (indices, values): (Vec<usize>, Vec<f64>) = entries
            .into_iter()
            .map(|(index, weight)| (index, weight / norm))
            .unzip();
        FeatureVector {
            inner: CsVec::new(self.dim(), indices, values),
        }
    }

    #[must_use]
    pub fn transform_all(&self, documents: &[String]) -> Vec<FeatureVector> {
        use rayon::prelude::*;
        documents.par_iter().map(|doc| self.transform(doc)).collect()
    }
}

// IDF(t) = ln((N + 1) / (DF(t) + 1)) + 1
fn smooth_idf(n: f64, df: f64) -> f64 {
    ((n + 1.0) / (df + 1.0)).ln() + 1.0
}
