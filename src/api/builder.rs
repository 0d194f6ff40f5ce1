use std::{env, error::Error, path::PathBuf};

use home::home_dir;

use crate::{
    archive::ArchiveDownloader,
    resolver::{RefResolver, StandardRefResolver},
    state::StateStore,
    Reposync,
};

#[derive(Default)]
pub struct ReposyncBuilder {
    temp_dir: Option<PathBuf>,
    state_file: Option<PathBuf>,
    git_path: Option<PathBuf>,
    ssh_path: Option<PathBuf>,
    resolver: Option<Box<dyn RefResolver>>,
    downloader: Option<Box<dyn ArchiveDownloader>>,
}

impl ReposyncBuilder {
    /// Directory ephemeral credential files are created under.
    ///
    /// Defaults to the system temporary directory.
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Location of the job state record shared with the cleanup invocation.
    ///
    /// Defaults to `$HOME/.reposync/state.toml`.
    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Path to the git binary.
    ///
    /// Defaults to `git`, resolved through `PATH`.
    pub fn git_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_path = Some(path.into());
        self
    }

    /// Path to the ssh binary referenced by the generated SSH command.
    ///
    /// Defaults to `ssh`, resolved through `PATH`.
    pub fn ssh_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_path = Some(path.into());
        self
    }

    /// Replaces the built-in ref resolution.
    pub fn resolver(mut self, resolver: Box<dyn RefResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Registers the archive fallback used when no git client is available.
    pub fn downloader(mut self, downloader: Box<dyn ArchiveDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn try_build(self) -> Result<Reposync, Box<dyn Error>> {
        let Self {
            temp_dir,
            state_file,
            git_path,
            ssh_path,
            resolver,
            downloader,
        } = self;

        let temp_dir = temp_dir.unwrap_or_else(env::temp_dir);
        let state_file = state_file.unwrap_or_else(default_state_file);

        Ok(Reposync {
            temp_dir,
            git_path: git_path.unwrap_or_else(|| PathBuf::from("git")),
            ssh_path: ssh_path.unwrap_or_else(|| PathBuf::from("ssh")),
            state: StateStore::new(state_file),
            resolver: resolver.unwrap_or_else(|| Box::new(StandardRefResolver)),
            downloader,
        })
    }
}

fn default_state_file() -> PathBuf {
    let mut state_file =
        home_dir().expect("Could not find home dir. Please define $HOME env variable.");
    state_file.push(".reposync/state.toml");
    state_file
}
