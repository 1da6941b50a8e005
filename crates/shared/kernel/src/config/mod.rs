use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `MHOST__ROUTING__HEADER_NAME`.
pub const ENV_PREFIX: &str = "MHOST";

/// File loaded when no path is given; the extension is inferred by the `config` crate.
pub const DEFAULT_CONFIG_FILE: &str = "mhost";

#[mhost_derive::mhost_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads settings from a file, then overlays `MHOST__`-prefixed environment variables.
///
/// Nested keys are separated by a double underscore, so `MHOST__ROUTING__FALLBACK=Main`
/// sets `routing.fallback`. Without a path, `mhost.{toml,json,yaml,...}` in the working
/// directory is used.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or unreadable, or if the merged
/// settings do not deserialize into `T`.
///
/// # Example
/// ```rust,no_run
/// use mhost_kernel::config::load_config;
/// use mhost_kernel::domain::config::HostConfig;
///
/// let config: HostConfig = load_config(Some("config/shells.toml")).unwrap();
/// assert!(!config.shells.is_empty());
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    info!("Loading config from {}", path.display());

    Config::builder()
        .add_source(File::from(path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
