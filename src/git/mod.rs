use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use thiserror::Error;

mod cli;
#[cfg(test)]
pub(crate) mod testing;

pub use cli::GitCli;

/// Remote name every synchronized directory fetches from.
pub const ORIGIN: &str = "origin";

/// Oldest git release the fetch and checkout arguments are valid for.
pub const MINIMUM_GIT_VERSION: GitVersion = GitVersion {
    major: 2,
    minor: 18,
    patch: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with code {code}: {stderr}")]
    Exit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("Could not determine the version of `{binary}` from `{output}`")]
    UnknownVersion { binary: String, output: String },
    #[error("Installed git is {found}, the minimum supported version is {minimum}")]
    UnsupportedVersion {
        found: GitVersion,
        minimum: GitVersion,
    },
    #[error("git-lfs is not functional: {0}")]
    LfsUnavailable(String),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// The revision-control client capability the rest of the crate is written
/// against. [`GitCli`] binds it to a real `git` binary; tests substitute a
/// fake. At most one client exists per working directory and per sync.
pub trait GitClient {
    fn work_dir(&self) -> &Path;

    /// Location of the persisted repository configuration file. Raw edits to
    /// this file are how secrets are injected without touching an argv.
    fn config_path(&self) -> PathBuf {
        self.work_dir().join(".git").join("config")
    }

    fn init(&self) -> Result<(), GitError>;
    fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError>;
    fn remote_url(&self, name: &str) -> Result<Option<String>, GitError>;
    fn fetch(&self, refspec: &[String], depth: u32) -> Result<(), GitError>;
    fn checkout(&self, target: &str, start_point: Option<&str>) -> Result<(), GitError>;
    fn detach_head(&self) -> Result<(), GitError>;
    fn is_detached(&self) -> Result<bool, GitError>;
    fn branch_list(&self, remote: bool) -> Result<Vec<String>, GitError>;
    fn branch_delete(&self, remote: bool, name: &str) -> Result<(), GitError>;
    fn try_clean(&self) -> bool;
    fn try_reset(&self) -> bool;
    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError>;
    fn config_get(&self, key: &str) -> Result<Option<String>, GitError>;
    fn config_exists(&self, key: &str) -> Result<bool, GitError>;
    fn try_config_unset(&self, key: &str) -> bool;

    /// Sets an environment variable on every subsequent client invocation.
    fn set_environment_variable(&mut self, name: &str, value: &str);
    fn remove_environment_variable(&mut self, name: &str);

    fn lfs_install(&self) -> Result<(), GitError>;
    fn lfs_fetch(&self, start_point: &str) -> Result<(), GitError>;
    fn log_last_commit(&self) -> Result<String, GitError>;
    fn try_disable_auto_maintenance(&self) -> bool;
}
