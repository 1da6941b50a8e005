//! # Logger
//!
//! Installs the process-wide `tracing` subscriber for shell host binaries: an optional
//! console layer plus an optional rolling, non-blocking file layer, both filtered by an
//! [`EnvFilter`] seeded from the configured level and overridable with `RUST_LOG`.
//!
//! Settings come either from the builder or from a [`LogConfig`] section deserialized
//! together with the rest of the host configuration.
//!
//! ## Example
//!
//! ```rust
//! # use mhost_logger::{LevelFilter, LogFormat, Logger};
//! let _logger = Logger::builder()
//!     .name("mhost")
//!     .level(LevelFilter::DEBUG)
//!     .env_filter("mhost_kernel=trace")
//!     .format(LogFormat::Compact)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::{MakeWriter, layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// Line format of a log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

/// Logging section of an application config file.
///
/// ```toml
/// [log]
/// level = "debug"
/// filter = "mhost_kernel=trace"
/// format = "json"
/// directory = "logs"
/// rotation = "hourly"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Extra `EnvFilter` directives, e.g. `mhost_kernel=debug`.
    pub filter: Option<String>,
    pub format: LogFormat,
    pub console: bool,
    /// Enables file output into this directory.
    pub directory: Option<PathBuf>,
    pub rotation: LogRotation,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            format: LogFormat::default(),
            console: true,
            directory: None,
            rotation: LogRotation::default(),
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl LogConfig {
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        LevelFilter::from_str(self.level.trim())
            .map_err(|_| LoggerError::invalid(format!("Unknown log level '{}'", self.level)))
    }
}

/// Configures and installs the global subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    filter: Option<String>,
    format: LogFormat,
    console: bool,
    path: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: LevelFilter::INFO,
            filter: None,
            format: LogFormat::default(),
            console: true,
            path: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl LoggerBuilder {
    /// Application name; also the prefix of rolled log files (`mhost.2026-01-31.log`).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Adds filter directives on top of the level (e.g., `mhost_kernel=trace`).
    ///
    /// `RUST_LOG` is only consulted when no directives are given here.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(self) -> Self {
        self.format(LogFormat::Json)
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Enables rolling file output into `path`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(mut self, rotation: impl Into<Rotation>) -> Self {
        self.rotation = rotation.into();
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    /// Applies a [`LogConfig`] section over the current settings.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn config(mut self, config: &LogConfig) -> Result<Self, LoggerError> {
        self.level = config.level_filter()?;
        self.filter.clone_from(&config.filter);
        self.format = config.format;
        self.console = config.console;
        self.path.clone_from(&config.directory);
        self.rotation = config.rotation.into();
        self.max_files = config.max_files;
        Ok(self)
    }

    /// Installs the subscriber.
    ///
    /// Keep the returned [`Logger`] alive for the lifetime of the program; dropping it stops
    /// the background file writer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`, an invalid
    ///   filter or when neither console nor file output is enabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] if file output cannot be set up.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;
        let env_filter = self.build_env_filter()?;

        let mut layers = Vec::new();
        if self.console {
            layers.push(format_layer(std::io::stdout, true, self.format));
        }

        let guard = if let Some(path) = &self.path {
            fs::create_dir_all(path)
                .context(format!("Failed to create log directory {}", path.display()))?;

            let appender = RollingFileAppender::builder()
                .rotation(self.rotation.clone())
                .filename_prefix(&self.name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(self.max_files)
                .build(path)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            layers.push(format_layer(writer, false, self.format));
            Some(guard)
        } else {
            None
        };

        if layers.is_empty() {
            return Err(LoggerError::invalid("Neither console nor file output is enabled"));
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(name = %self.name, format = ?self.format, file = guard.is_some(), "Logger initialized");

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::invalid("Logger name cannot be empty"));
        }
        if self.path.is_some() && self.max_files == 0 {
            return Err(LoggerError::invalid("max_files must be greater than zero"));
        }
        Ok(())
    }

    fn build_env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        self.filter.as_ref().map_or_else(
            || Ok(builder.from_env_lossy()),
            |filter| {
                builder.parse(filter).map_err(|e| {
                    LoggerError::invalid(format!("Invalid env filter '{filter}': {e}"))
                })
            },
        )
    }
}

fn format_layer<S, W>(writer: W, ansi: bool, format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let base = layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
    }
}

/// Handle to the installed subscriber; owns the file writer's worker guard.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Shorthand for `Logger::builder().name(name).config(config)?.init()`.
    ///
    /// # Errors
    /// See [`LoggerBuilder::init`].
    pub fn from_config(name: impl Into<String>, config: &LogConfig) -> Result<Self, LoggerError> {
        Self::builder().name(name).config(config)?.init()
    }

    /// Whether file output (and therefore a background writer) is active.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing file logs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn config_section_overrides_builder_defaults() {
        let config = LogConfig {
            level: "debug".to_owned(),
            filter: Some("mhost_kernel=trace".to_owned()),
            format: LogFormat::Json,
            console: false,
            directory: Some(PathBuf::from("logs")),
            rotation: LogRotation::Hourly,
            max_files: 3,
        };
        let builder = Logger::builder().name("mhost").config(&config).unwrap();

        assert_eq!(builder.level, LevelFilter::DEBUG);
        assert_eq!(builder.filter.as_deref(), Some("mhost_kernel=trace"));
        assert_eq!(builder.format, LogFormat::Json);
        assert!(!builder.console);
        assert_eq!(builder.rotation, Rotation::HOURLY);
        assert_eq!(builder.max_files, 3);
    }

    #[test]
    #[serial]
    fn unknown_level_is_rejected() {
        let config = LogConfig { level: "loud".to_owned(), ..LogConfig::default() };
        let err = Logger::builder().name("mhost").config(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown log level 'loud'"));
    }

    #[test]
    #[serial]
    fn invalid_builders_fail_before_installing_anything() {
        let unnamed = Logger::builder().init().unwrap_err();
        assert!(matches!(unnamed, LoggerError::InvalidConfiguration { .. }));

        let silent = Logger::builder().name("mhost").console(false).init().unwrap_err();
        assert!(silent.to_string().contains("Neither console nor file output"));

        let bad_filter = Logger::builder().name("mhost").env_filter("mhost=verbose").init().unwrap_err();
        assert!(bad_filter.to_string().contains("Invalid env filter"));
    }

    #[test]
    #[serial]
    fn file_output_creates_directory_and_log_file() {
        let tmp = tempdir().unwrap();
        let log_dir = tmp.path().join("nested").join("logs");

        let logger = Logger::builder()
            .name("mhost-unit")
            .console(false)
            .path(&log_dir)
            .rotation(LogRotation::Never)
            .init()
            .unwrap();
        assert!(logger.has_file_output());

        tracing::info!("unit test line");
        std::thread::sleep(Duration::from_millis(20));
        drop(logger);

        let has_log = fs::read_dir(&log_dir)
            .unwrap()
            .flatten()
            .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"));
        assert!(has_log, "a log file should be created");
    }
}
