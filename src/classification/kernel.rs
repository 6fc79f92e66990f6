//! 特徴ベクトル間の類似度（カーネル）。
use linfa::dataset::Pr;
use linfa_svm::SvmParams;
use serde::{Deserialize, Serialize};

use super::features::FeatureVector;

/// 判定境界に使うカーネル関数。学習は linfa-svm、判定値の計算はこの定義で行う。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Kernel {
    /// k(x, y) = x·y
    Linear,
    /// k(x, y) = exp(-γ‖x − y‖²)
    Rbf { gamma: f64 },
    /// k(x, y) = (x·y + c₀)^d
    Poly { coef0: f64, degree: u32 },
}

impl Kernel {
    #[must_use]
    pub fn evaluate(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        match *self {
            Self::Linear => x.dot(y),
            Self::Rbf { gamma } => (-gamma * x.squared_distance(y)).exp(),
            Self::Poly { coef0, degree } => (x.dot(y) + coef0).powf(f64::from(degree)),
        }
    }

    /// カーネル幅（RBF 以外は `None`）。
    #[must_use]
    pub fn gamma(&self) -> Option<f64> {
        match *self {
            Self::Rbf { gamma } => Some(gamma),
            Self::Linear | Self::Poly { .. } => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Rbf { .. } => "rbf",
            Self::Poly { .. } => "poly",
        }
    }

    /// linfa のガウスカーネルは exp(-‖x − y‖² / eps) なので eps = 1 / γ。
    pub(crate) fn configure(&self, params: SvmParams<f64, Pr>) -> SvmParams<f64, Pr> {
        match *self {
            Self::Linear => params.linear_kernel(),
            Self::Rbf { gamma } => params.gaussian_kernel(gamma.recip()),
            Self::Poly { coef0, degree } => params.polynomial_kernel(coef0, f64::from(degree)),
        }
    }
}
