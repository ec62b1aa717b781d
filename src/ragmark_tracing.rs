use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

// For now just log to a daily rolling file; stdout stays clean for reports
pub fn init(config: &Config) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(
        config.log_dir(),
        format!("{}.log", config.project_name),
    );

    let fmt_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    let env_filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
        .add_directive("h2=error".parse()?)
        .add_directive("hyper=error".parse()?);

    tracing_subscriber::registry()
        .with(env_filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
