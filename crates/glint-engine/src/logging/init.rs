use std::sync::Once;

use log::LevelFilter;

/// Logger configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. `"glint_engine=debug"`.
    /// Takes precedence over `RUST_LOG`.
    pub env_filter: Option<String>,
    /// Level used when neither `env_filter` nor `RUST_LOG` is set.
    pub default_level: LevelFilter,
    /// Caps `wgpu_core`/`wgpu_hal` at `warn` under the default level.
    pub quiet_gpu: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: LevelFilter::Info,
            quiet_gpu: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Debug output for the overlay crate only.
    pub fn verbose() -> Self {
        Self { env_filter: Some("info,glint_engine=debug".into()), ..Self::default() }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls do nothing, as does a call made
/// after the host installed its own logger.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        if build_logger(&config, rust_log.as_deref()).try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

fn build_logger(config: &LoggingConfig, rust_log: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    match config.env_filter.as_deref().or(rust_log) {
        Some(filter) => {
            builder.parse_filters(filter);
        }
        None => {
            builder.filter_level(config.default_level);
            if config.quiet_gpu {
                builder.filter_module("wgpu_core", LevelFilter::Warn);
                builder.filter_module("wgpu_hal", LevelFilter::Warn);
            }
        }
    }

    builder.write_style(config.write_style);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_beats_rust_log() {
        let config = LoggingConfig { env_filter: Some("debug".into()), ..LoggingConfig::default() };
        let logger = build_logger(&config, Some("error")).build();
        assert_eq!(logger.filter(), LevelFilter::Debug);
    }

    #[test]
    fn rust_log_used_without_explicit_filter() {
        let logger = build_logger(&LoggingConfig::default(), Some("trace")).build();
        assert_eq!(logger.filter(), LevelFilter::Trace);
    }

    #[test]
    fn default_level_applies_last() {
        let config = LoggingConfig { default_level: LevelFilter::Warn, quiet_gpu: false, ..LoggingConfig::default() };
        let logger = build_logger(&config, None).build();
        assert_eq!(logger.filter(), LevelFilter::Warn);
    }
}
