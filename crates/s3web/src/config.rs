//! Server configuration file.
//!
//! One file in YAML, JSON or TOML, picked by extension:
//!
//! ```toml
//! port = "8000"
//! s3bucket = "my-site"
//! awsRegion = "eu-west-1"
//! homepage = "index.html"
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PORT: &str = "8000";
pub const DEFAULT_REGION: &str = "eu-west-1";
const REGION_ENV: &str = "AWS_REGION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration file: {0}")]
    Parse(String),

    #[error("unknown configuration file format {0:?} (supported: yaml, yml, json, toml)")]
    UnknownFormat(String),

    #[error("configuration has no s3bucket")]
    MissingBucket,

    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// Configuration file formats, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(ConfigError::UnknownFormat(other.to_owned())),
        }
    }
}

/// The file as written; every field optional.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    port: Option<String>,
    #[serde(default)]
    s3bucket: Option<String>,
    #[serde(default, rename = "awsRegion")]
    aws_region: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: String,
    pub s3bucket: String,
    pub aws_region: String,
    /// Object served for directory paths; empty means none.
    pub homepage: String,
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::parse(&contents, format, std::env::var(REGION_ENV).ok())?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Parse configuration text, applying defaults. `env_region` is used when
    /// the file sets no region.
    pub fn parse(
        contents: &str,
        format: Format,
        env_region: Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = match format {
            Format::Yaml => {
                serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Format::Json => {
                serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Format::Toml => {
                toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };

        let s3bucket = non_empty(raw.s3bucket).ok_or(ConfigError::MissingBucket)?;
        let aws_region = non_empty(raw.aws_region)
            .or_else(|| non_empty(env_region))
            .unwrap_or_else(|| DEFAULT_REGION.to_owned());

        Ok(Self {
            port: non_empty(raw.port).unwrap_or_else(|| DEFAULT_PORT.to_owned()),
            s3bucket,
            aws_region,
            homepage: raw.homepage.unwrap_or_default(),
        })
    }

    /// Address to listen on: the configured port on all interfaces.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let port = self
            .port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(self.port.clone()))?;
        Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
