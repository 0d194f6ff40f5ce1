use std::{
    error::Error,
    path::{Path, PathBuf},
};

use crate::{
    archive::ArchiveDownloader,
    model::SyncSettings,
    resolver::RefResolver,
    source::{self, SyncContext},
    state::StateStore,
};

mod builder;

pub use builder::ReposyncBuilder;

/// Working-directory synchronization for automated job runners.
pub struct Reposync {
    temp_dir: PathBuf,
    git_path: PathBuf,
    ssh_path: PathBuf,
    state: StateStore,
    resolver: Box<dyn RefResolver>,
    downloader: Option<Box<dyn ArchiveDownloader>>,
}

impl Reposync {
    pub fn builder() -> ReposyncBuilder {
        ReposyncBuilder::default()
    }

    /// Synchronizes the working directory with the requested revision.
    pub fn get_source(&self, settings: &SyncSettings) -> Result<(), Box<dyn Error>> {
        source::get_source(&self.context(), settings)?;
        Ok(())
    }

    /// Removes credentials a previous synchronization left behind, using only
    /// the persisted job state.
    pub fn cleanup(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        source::cleanup(&self.context(), path.as_ref())?;
        Ok(())
    }

    fn context(&self) -> SyncContext<'_> {
        SyncContext {
            temp_dir: &self.temp_dir,
            git_path: &self.git_path,
            ssh_path: &self.ssh_path,
            state: &self.state,
            resolver: self.resolver.as_ref(),
            downloader: self.downloader.as_deref(),
        }
    }
}
