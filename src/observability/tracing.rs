use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LogLevel};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Tracing サブスクライバを一度だけ初期化する。
///
/// `RUST_LOG` が設定されていればそれを優先し、なければ設定のログレベルを使う。
///
/// # Errors
/// サブスクライバの初期化に失敗した場合はエラーを返す。
pub fn init(level: LogLevel, format: LogFormat) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let default_level = tracing::Level::from(level);
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_ascii_lowercase()));

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = match format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().with_target(false).json())
                .try_init(),
            LogFormat::Text => registry
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .try_init(),
        };
        result.map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;

        info!(?level, ?format, "tracing initialized");
        Ok::<(), Error>(())
    })?;
    Ok(())
}
