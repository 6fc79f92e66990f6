// ν-one-class SVM（linfa-svm）による判定境界の学習。
use clap::ValueEnum;
use linfa::dataset::Pr;
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::features::FeatureVector;
use super::kernel::Kernel;
use crate::error::{PipelineError, PipelineResult};

const BYTES_PER_MIB: usize = 1024 * 1024;

/// 設定から選べるカーネルの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Linear,
    #[default]
    Rbf,
    Poly,
}

/// トレーナーに明示的に渡すハイパーパラメータ。
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryParams {
    pub kernel: KernelKind,
    /// 学習点のうち境界の外に出てよい割合の上限（ν）。
    pub nu: f64,
    /// 未指定なら `1 / 特徴次元`。
    pub gamma: Option<f64>,
    pub degree: u32,
    pub coef0: f64,
    /// 学習行列とグラム行列に使ってよいメモリ量（MiB）。
    pub kernel_memory_mb: usize,
}

impl Default for BoundaryParams {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Rbf,
            nu: 0.1,
            gamma: None,
            degree: 3,
            coef0: 0.0,
            kernel_memory_mb: 2048,
        }
    }
}

impl BoundaryParams {
    /// # Errors
    /// ν が (0, 1] の外、γ が正でない、メモリ上限が 0 の場合。
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "nu must be in (0, 1], got {}",
                self.nu
            )));
        }
        if let Some(gamma) = self.gamma
            && !(gamma.is_finite() && gamma > 0.0)
        {
            return Err(PipelineError::InvalidParameter(format!(
                "gamma must be positive, got {gamma}"
            )));
        }
        if self.kernel_memory_mb == 0 {
            return Err(PipelineError::InvalidParameter(
                "kernel_memory_mb must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_kernel(&self, dim: usize) -> Kernel {
        #[allow(clippy::cast_precision_loss)]
        let gamma = self.gamma.unwrap_or(1.0 / dim as f64);
        match self.kernel {
            KernelKind::Linear => Kernel::Linear,
            KernelKind::Rbf => Kernel::Rbf { gamma },
            KernelKind::Poly => Kernel::Poly {
                coef0: self.coef0,
                degree: self.degree,
            },
        }
    }
}

/// 密な学習行列（rows × dim）と linfa が保持するグラム行列（rows × rows）の概算。
fn training_footprint_mb(rows: usize, dim: usize) -> usize {
    let cells = rows
        .saturating_mul(rows)
        .saturating_add(rows.saturating_mul(dim));
    cells
        .saturating_mul(std::mem::size_of::<f64>())
        .div_ceil(BYTES_PER_MIB)
}

fn dense_records(points: &[FeatureVector], dim: usize) -> Array2<f64> {
    let mut records = Array2::zeros((points.len(), dim));
    for (mut row, point) in records.outer_iter_mut().zip(points) {
        for (&index, &value) in point.indices().iter().zip(point.values()) {
            row[index] = value;
        }
    }
    records
}

/// 学習済みの判定境界。`score(x) = Σ αᵢ K(svᵢ, x) − ρ`、0 以上なら境界の内側。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionBoundary {
    kernel: Kernel,
    support_vectors: Vec<FeatureVector>,
    coefficients: Vec<f64>,
    rho: f64,
}

impl DecisionBoundary {
    /// 正例のみの特徴行列から判定境界を学習する。
    ///
    /// # Errors
    /// 行が 0 件なら `EmptyCorpus`、パラメータ不正・次元 0・メモリ上限超過・学習失敗なら
    /// `InvalidParameter`。
    pub fn train(points: &[FeatureVector], params: &BoundaryParams) -> PipelineResult<Self> {
        params.validate()?;
        let Some(first) = points.first() else {
            return Err(PipelineError::EmptyCorpus {
                root: std::path::PathBuf::new(),
            });
        };
        let dim = first.dim();
        if dim == 0 {
            return Err(PipelineError::InvalidParameter(
                "feature dimension is zero (vocabulary is empty)".to_string(),
            ));
        }
        if points.iter().any(|point| point.dim() != dim) {
            return Err(PipelineError::InvalidParameter(
                "training vectors have inconsistent dimensions".to_string(),
            ));
        }
        let required_mb = training_footprint_mb(points.len(), dim);
        if required_mb > params.kernel_memory_mb {
            return Err(PipelineError::InvalidParameter(format!(
                "training on {} rows needs about {required_mb} MiB, over the {} MiB kernel memory budget",
                points.len(),
                params.kernel_memory_mb
            )));
        }

        let kernel = params.resolve_kernel(dim);
        let dataset = DatasetBase::from(dense_records(points, dim));
        let svm: Svm<f64, bool> = kernel
            .configure(Svm::<f64, Pr>::params().nu_weight(params.nu))
            .fit(&dataset)
            .map_err(|error| {
                PipelineError::InvalidParameter(format!("one-class fit failed: {error}"))
            })?;

        // alpha is indexed like the training rows; zero entries are not support vectors.
        let mut support_vectors = Vec::new();
        let mut coefficients = Vec::new();
        for (point, &alpha) in points.iter().zip(&svm.alpha) {
            if alpha > 0.0 {
                support_vectors.push(point.clone());
                coefficients.push(alpha);
            }
        }

        info!(
            kernel = kernel.name(),
            gamma = kernel.gamma(),
            nu = params.nu,
            training_rows = points.len(),
            support_vectors = support_vectors.len(),
            rho = svm.rho,
            "decision boundary trained"
        );

        Ok(Self {
            kernel,
            support_vectors,
            coefficients,
            rho: svm.rho,
        })
    }

    /// 保存済みの境界を検証して復元する。
    ///
    /// # Errors
    /// 係数とサポートベクトルの数が合わない、次元が揃わない、非有限値を含む場合。
    pub fn validate_for_dim(&self, dim: usize) -> PipelineResult<()> {
        if self.support_vectors.len() != self.coefficients.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "{} support vectors but {} coefficients",
                self.support_vectors.len(),
                self.coefficients.len()
            )));
        }
        if self.support_vectors.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "decision boundary has no support vectors".to_string(),
            ));
        }
        if self.support_vectors.iter().any(|sv| sv.dim() != dim) {
            return Err(PipelineError::InvalidParameter(format!(
                "support vector dimension does not match vocabulary size {dim}"
            )));
        }
        if !self.rho.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::InvalidParameter(
                "decision boundary contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    /// 符号付きの判定値。0 以上なら目標カテゴリ。
    #[must_use]
    pub fn score(&self, x: &FeatureVector) -> f64 {
        let mut total = 0.0;
        for (sv, coefficient) in self.support_vectors.iter().zip(&self.coefficients) {
            total += coefficient * self.kernel.evaluate(sv, x);
        }
        total - self.rho
    }

    #[must_use]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[must_use]
    pub fn rho(&self) -> f64 {
        self.rho
    }

    #[must_use]
    pub fn support_vector_count(&self) -> usize {
        self.support_vectors.len()
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}
