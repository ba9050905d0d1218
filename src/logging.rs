//! Logger setup.
//!
//! The crate only emits through the `log` facade. Hosts that have no logger
//! of their own can call [`init_logging`] once at startup.

use std::sync::Once;

/// `env_filter` uses the `env_logger` filter syntax (`"warn"`,
/// `"taktl::tree=trace"`). When unset, `RUST_LOG` is consulted, then `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Route output through the test harness capture.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn for_tests(mut self) -> Self {
        self.is_test = true;
        self
    }
}

static INIT: Once = Once::new();

/// Install an `env_logger` once. Later calls are ignored, and so is a
/// logger installed by someone else first.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match config.env_filter {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => match std::env::var("RUST_LOG") {
                Ok(filter) => {
                    builder.parse_filters(&filter);
                }
                Err(_) => {
                    builder.filter_level(log::LevelFilter::Warn);
                }
            },
        }
        builder.write_style(config.write_style).is_test(config.is_test);
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging(LoggingConfig::default().with_filter("debug").for_tests());
        init_logging(LoggingConfig::default());
        log::debug!("still fine");
    }
}
