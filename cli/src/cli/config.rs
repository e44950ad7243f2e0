use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "vauntware";
const APP: &str = "subtime";
const APP_CAPS: &str = "SUBTIME";

const STRICT_KEY: &str = "strict";
const MILLIS_SEPARATOR_KEY: &str = "millis_separator";
const DEFAULT_MILLIS_SEPARATOR: &str = ",";

const DEFAULT_CONFIG_FILE: &str = "subtime.toml";

type ExtConfigBuilder = config::ConfigBuilder<config::builder::DefaultState>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),
    #[error("unable to get user home directory")]
    NoUserHome,
    #[error("path is not utf8: {:?}", _0)]
    NonUtf8Path(PathBuf),
    #[error("millis separator must be `,` or `.`, found {:?}", _0)]
    InvalidSeparator(String),
}

fn camino_path(std_path: &Path) -> Result<&Utf8Path, ConfigError> {
    Utf8Path::from_path(std_path).ok_or_else(|| ConfigError::NonUtf8Path(std_path.to_path_buf()))
}

fn new_config_builder() -> Result<ExtConfigBuilder, ConfigError> {
    Ok(config::Config::builder()
        .set_default(STRICT_KEY, false)?
        .set_default(MILLIS_SEPARATOR_KEY, DEFAULT_MILLIS_SEPARATOR)?)
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config_dir: Utf8PathBuf,
    config_path: Option<Utf8PathBuf>,
    load_environment: bool,
    config_builder: ExtConfigBuilder,
}

impl ConfigBuilder {
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APP)
            .ok_or(ConfigError::NoUserHome)?;
        Self::with_config_dir(dirs.config_dir())
    }

    /// Look for the default config file in `config_dir` instead of the
    /// user's config directory.
    pub fn with_config_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            config_dir: camino_path(config_dir)?.to_path_buf(),
            config_path: None,
            load_environment: false,
            config_builder: new_config_builder()?,
        })
    }

    /// Should we load configuration from the environment?
    pub fn load_environment(mut self, load_environment: bool) -> Self {
        self.load_environment = load_environment;
        self
    }

    pub fn config_file(mut self, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        self.config_path = config_file
            .map(|p| camino_path(p).map(|p| p.to_path_buf()))
            .transpose()?;
        Ok(self)
    }

    /// Force strict parsing on. `false` leaves the configured value alone.
    pub fn strict(mut self, strict: bool) -> Result<Self, ConfigError> {
        self.config_builder = self
            .config_builder
            .set_override_option(STRICT_KEY, strict.then_some(true))?;
        Ok(self)
    }

    pub fn build(mut self) -> Result<SubtimeConfig, ConfigError> {
        let cfg_file = self
            .config_path
            .unwrap_or_else(|| self.config_dir.join(DEFAULT_CONFIG_FILE));

        if cfg_file.exists() {
            log::debug!("loading config file {}", cfg_file);
            self.config_builder = self
                .config_builder
                .add_source(config::File::from(cfg_file.as_std_path()));
        }

        if self.load_environment {
            self.config_builder = self
                .config_builder
                .add_source(config::Environment::with_prefix(APP_CAPS))
        }

        let inner = self.config_builder.build()?;
        let subtime_cfg = SubtimeConfig {
            strict: inner.get_bool(STRICT_KEY)?,
            millis_separator: parse_separator(&inner.get_string(MILLIS_SEPARATOR_KEY)?)?,
        };
        log::trace!("{:#?}", subtime_cfg);
        Ok(subtime_cfg)
    }
}

fn parse_separator(s: &str) -> Result<char, ConfigError> {
    match s {
        "," => Ok(','),
        "." => Ok('.'),
        _ => Err(ConfigError::InvalidSeparator(s.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtimeConfig {
    /// Reject malformed timestamps instead of producing `NaN`
    pub strict: bool,
    /// Decimal marker for millisecond output
    pub millis_separator: char,
}
