//! `saep.toml` loading.

use std::path::{Path, PathBuf};

use saep_eval::DEFAULT_MAX_BRANCH_DEPTH;
use serde::Deserialize;

use crate::OutputFormat;

pub(crate) const DEFAULT_CONFIG_PATH: &str = "saep.toml";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("error reading config '{}': {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error parsing config '{}': {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub log: LogConfig,
    pub output: OutputConfig,
    pub eval: EvalConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct OutputConfig {
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EvalConfig {
    pub max_branch_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_branch_depth: DEFAULT_MAX_BRANCH_DEPTH,
        }
    }
}

impl Config {
    /// Load from an explicit path, which must exist, or from `./saep.toml`,
    /// which may be absent.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Config::parse(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub(crate) fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.eval.max_branch_depth, 32);
        assert_eq!(config.output.format, None);
    }

    #[test]
    fn all_sections() {
        let config = Config::parse(
            r#"
            [log]
            level = "saep_eval=debug"

            [output]
            format = "json"

            [eval]
            max_branch_depth = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.log.level, "saep_eval=debug");
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(config.eval.max_branch_depth, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[eval]\nmax_depth = 3\n").is_err());
    }
}
