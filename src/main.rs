use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use ito_novelty::{config::Config, observability, pipeline};

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    let config = Config::parse();
    if let Err(error) = observability::init(config.log_level, config.log_format) {
        eprintln!("failed to initialize tracing: {error:#}");
        return ExitCode::FAILURE;
    }

    match execute(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = ?error, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(config: &Config) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    let summary = pipeline::run(config).with_context(|| {
        format!(
            "novelty pipeline failed for {}",
            config.evaluation_file.display()
        )
    })?;
    info!(
        target_rows = summary.target,
        other_rows = summary.other,
        "done"
    );
    Ok(())
}
