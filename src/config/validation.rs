use super::{Config, ConfigError};

impl Config {
    /// # Errors
    /// 設定値が矛盾している、または範囲外の場合。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corpus_root.is_none() && self.model_in.is_none() {
            return Err(ConfigError::Missing(
                "--corpus-root (ITO_CORPUS_ROOT) is required unless --model-in is given",
            ));
        }

        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(ConfigError::InvalidConfig(format!(
                "nu must be in (0, 1], got {}",
                self.nu
            )));
        }

        if self.max_features == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_features must be greater than 0".to_string(),
            ));
        }

        if let Some(gamma) = self.gamma
            && !(gamma.is_finite() && gamma > 0.0)
        {
            return Err(ConfigError::InvalidConfig(format!(
                "gamma must be positive, got {gamma}"
            )));
        }

        if self.kernel_memory_mb == 0 {
            return Err(ConfigError::InvalidConfig(
                "kernel_memory_mb must be greater than 0".to_string(),
            ));
        }

        if self.target_output == self.other_output {
            return Err(ConfigError::InvalidConfig(format!(
                "target and other outputs must differ, both are {}",
                self.target_output.display()
            )));
        }

        if self.target_label == self.other_label {
            return Err(ConfigError::InvalidConfig(format!(
                "target and other labels must differ, both are '{}'",
                self.target_label
            )));
        }

        if self.text_column.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "text column name must not be empty".to_string(),
            ));
        }

        if self.label_column.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "label column name must not be empty".to_string(),
            ));
        }

        if self.label_column == self.text_column {
            return Err(ConfigError::InvalidConfig(format!(
                "label column must differ from the text column '{}'",
                self.text_column
            )));
        }

        Ok(())
    }
}
