use std::path::PathBuf;

use clap::Parser;

use super::{ConfigError, LogFormat, LogLevel};
use crate::classification::{BoundaryParams, KernelKind, LabelNames};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory scanned recursively for training tables (.csv/.tsv)
    #[arg(long, env = "ITO_CORPUS_ROOT")]
    pub corpus_root: Option<PathBuf>,

    /// Table to classify
    #[arg(long, env = "ITO_EVALUATION_FILE")]
    pub evaluation_file: PathBuf,

    /// Column holding the free-text description
    #[arg(long, env = "ITO_TEXT_COLUMN", default_value = "description")]
    pub text_column: String,

    /// Maximum vocabulary size
    #[arg(long, env = "ITO_MAX_FEATURES", default_value = "1000")]
    pub max_features: usize,

    /// Upper bound on the fraction of training points left outside the boundary
    #[arg(long, env = "ITO_NU", default_value = "0.1")]
    pub nu: f64,

    /// Kernel width (defaults to 1 / vocabulary size)
    #[arg(long, env = "ITO_GAMMA")]
    pub gamma: Option<f64>,

    /// Kernel function
    #[arg(long, env = "ITO_KERNEL", default_value = "rbf")]
    pub kernel: KernelKind,

    /// Degree of the polynomial kernel
    #[arg(long, env = "ITO_KERNEL_DEGREE", default_value = "3")]
    pub degree: u32,

    /// Independent term of the polynomial kernel
    #[arg(long, env = "ITO_KERNEL_COEF0", default_value = "0.0")]
    pub coef0: f64,

    /// Memory budget in MiB for the dense training matrix and the kernel matrix
    #[arg(long, env = "ITO_KERNEL_MEMORY_MB", default_value = "2048")]
    pub kernel_memory_mb: usize,

    /// Output table for rows inside the boundary
    #[arg(long, env = "ITO_TARGET_OUTPUT", default_value = "ito_predictions.csv")]
    pub target_output: PathBuf,

    /// Output table for rows outside the boundary
    #[arg(long, env = "ITO_OTHER_OUTPUT", default_value = "non_ito_predictions.csv")]
    pub other_output: PathBuf,

    /// Label written for rows inside the boundary
    #[arg(long, env = "ITO_TARGET_LABEL", default_value = "ITO")]
    pub target_label: String,

    /// Label written for rows outside the boundary
    #[arg(long, env = "ITO_OTHER_LABEL", default_value = "Non-ITO")]
    pub other_label: String,

    /// Name of the label column appended to the outputs
    #[arg(long, env = "ITO_LABEL_COLUMN", default_value = "predicted_label")]
    pub label_column: String,

    /// Save the trained model as JSON
    #[arg(long, env = "ITO_MODEL_OUT")]
    pub model_out: Option<PathBuf>,

    /// Score with a previously saved model instead of training
    #[arg(long, env = "ITO_MODEL_IN")]
    pub model_in: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "ITO_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "ITO_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl Config {
    /// 引数を解析して検証する。
    ///
    /// # Errors
    /// 引数が解析できない、または検証に失敗した場合。
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config =
            Self::try_parse_from(args).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn boundary_params(&self) -> BoundaryParams {
        BoundaryParams {
            kernel: self.kernel,
            nu: self.nu,
            gamma: self.gamma,
            degree: self.degree,
            coef0: self.coef0,
            kernel_memory_mb: self.kernel_memory_mb,
        }
    }

    #[must_use]
    pub fn label_names(&self) -> LabelNames {
        LabelNames {
            target: self.target_label.clone(),
            other: self.other_label.clone(),
        }
    }
}
