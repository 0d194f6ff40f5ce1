use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use fs4::fs_std::FileExt;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long a writer waits for another invocation to release the record.
const LOCK_WAIT: Duration = Duration::from_secs(30);

/// The slice of credential state that must survive across separate process
/// invocations: the main sync writes it, the post-job cleanup reads it.
///
/// Entries are never actively erased. Once the files they point at are gone,
/// the record simply stops being actionable.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ssh_key_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ssh_known_hosts_path: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error accessing the job state record: {0}")]
    IO(#[from] std::io::Error),
    #[error("Job state record is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Job state record could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A small TOML record file read and written by both the sync and the later
/// cleanup invocation. Updates run under an exclusive file lock so a cleanup
/// racing a crashed-and-retried sync never observes a torn write.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> StateStore {
        StateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<JobState, StateError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(JobState::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn update(&self, apply: impl FnOnce(&mut JobState)) -> Result<JobState, StateError> {
        let _lock = self.acquire_lock()?;
        let mut state = self.load()?;
        apply(&mut state);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(&state)?)?;
        Ok(state)
    }

    fn acquire_lock(&self) -> Result<LockGuard, StateError> {
        let lock_path = self.path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&lock_path)?;
        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(_) => return Ok(LockGuard { _file: file }),
                Err(error)
                    if error.raw_os_error() == fs4::lock_contended_error().raw_os_error()
                        && start.elapsed() < LOCK_WAIT =>
                {
                    debug!(
                        "Job state record at {} is locked, retrying",
                        lock_path.display()
                    );
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}

struct LockGuard {
    _file: File,
}
