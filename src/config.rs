use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Ambient, environment-driven configuration of the runner host: where
/// ephemeral files and the job state record live, and which binaries to
/// drive. Everything here has a sensible default resolved by the builder.
pub struct ReposyncConfig {
    pub temp_dir: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub git_path: Option<PathBuf>,
    pub ssh_path: Option<PathBuf>,
}

impl ReposyncConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            temp_dir: raw_config.runner.temp,
            state_file: raw_config.state.file,
            git_path: raw_config.git.path,
            ssh_path: raw_config.ssh.path,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    runner: RunnerConfig,
    #[serde(default)]
    state: StateConfig,
    #[serde(default)]
    git: GitConfig,
    #[serde(default)]
    ssh: SshConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RunnerConfig {
    temp: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct StateConfig {
    file: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct GitConfig {
    path: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct SshConfig {
    path: Option<PathBuf>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("REPOSYNC")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
