//! In-memory [`GitClient`] used by unit tests.
//!
//! Keeps repository state in a shared cell so a test can hold a handle onto
//! the client after ownership moved into the code under test, and mirrors the
//! configuration map into a real `.git/config` file so raw-edit paths can be
//! exercised against actual bytes.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use super::{GitClient, GitError};

#[derive(Default)]
pub(crate) struct FakeGitState {
    pub config: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub local_branches: Vec<String>,
    pub remote_branches: Vec<String>,
    pub detached: bool,
    pub fail_clean: bool,
    pub fail_reset: bool,
    pub fail_fetch: bool,
    /// When cleared, configuration changes stop reaching the config file,
    /// simulating a client that persists configuration elsewhere.
    pub config_file_writes: bool,
    pub calls: Vec<String>,
}

#[derive(Clone)]
pub(crate) struct FakeGit {
    work_dir: PathBuf,
    pub state: Rc<RefCell<FakeGitState>>,
}

impl FakeGit {
    /// A client over a directory with no repository metadata yet.
    pub fn empty(work_dir: &Path) -> FakeGit {
        FakeGit {
            work_dir: work_dir.to_path_buf(),
            state: Rc::new(RefCell::new(FakeGitState {
                config_file_writes: true,
                ..FakeGitState::default()
            })),
        }
    }

    /// A client over an existing checkout of `url`, on a branch.
    pub fn existing_repo(work_dir: &Path, url: &str) -> FakeGit {
        let git = FakeGit::empty(work_dir);
        fs::create_dir_all(work_dir.join(".git")).unwrap();
        {
            let mut state = git.state.borrow_mut();
            state
                .config
                .insert("remote.origin.url".to_string(), url.to_string());
        }
        git.write_config_file();
        git
    }

    /// A second handle onto the same underlying repository state.
    pub fn handle(&self) -> FakeGit {
        self.clone()
    }

    pub fn config_value(&self, key: &str) -> Option<String> {
        self.state.borrow().config.get(key).cloned()
    }

    pub fn env_value(&self, name: &str) -> Option<String> {
        self.state.borrow().env.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.borrow_mut().calls.push(call.into());
    }

    fn write_config_file(&self) {
        let state = self.state.borrow();
        if !state.config_file_writes {
            return;
        }
        let mut rendered = String::new();
        for (key, value) in &state.config {
            rendered.push_str(&format!("{key} = {value}\n"));
        }
        drop(state);
        fs::create_dir_all(self.work_dir.join(".git")).unwrap();
        fs::write(self.config_path(), rendered).unwrap();
    }

    pub fn rewrite_config_file(&self) {
        self.write_config_file();
    }
}

impl GitClient for FakeGit {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn init(&self) -> Result<(), GitError> {
        self.record("init");
        fs::create_dir_all(self.work_dir.join(".git"))?;
        self.write_config_file();
        Ok(())
    }

    fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.record(format!("remote_add {name} {url}"));
        self.config_set(&format!("remote.{name}.url"), url)
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        self.config_get(&format!("remote.{name}.url"))
    }

    fn fetch(&self, refspec: &[String], depth: u32) -> Result<(), GitError> {
        self.record(format!("fetch depth={depth} {}", refspec.join(" ")));
        if self.state.borrow().fail_fetch {
            return Err(GitError::Exit {
                command: "git fetch".to_string(),
                code: 128,
                stderr: "could not read from remote repository".to_string(),
            });
        }
        Ok(())
    }

    fn checkout(&self, target: &str, start_point: Option<&str>) -> Result<(), GitError> {
        match start_point {
            Some(start_point) => self.record(format!("checkout {target} from {start_point}")),
            None => self.record(format!("checkout {target}")),
        }
        Ok(())
    }

    fn detach_head(&self) -> Result<(), GitError> {
        self.record("detach_head");
        self.state.borrow_mut().detached = true;
        Ok(())
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        Ok(self.state.borrow().detached)
    }

    fn branch_list(&self, remote: bool) -> Result<Vec<String>, GitError> {
        let state = self.state.borrow();
        Ok(if remote {
            state.remote_branches.clone()
        } else {
            state.local_branches.clone()
        })
    }

    fn branch_delete(&self, remote: bool, name: &str) -> Result<(), GitError> {
        self.record(format!(
            "branch_delete {}{name}",
            if remote { "remote " } else { "" }
        ));
        let mut state = self.state.borrow_mut();
        let branches = if remote {
            &mut state.remote_branches
        } else {
            &mut state.local_branches
        };
        branches.retain(|branch| branch != name);
        Ok(())
    }

    fn try_clean(&self) -> bool {
        self.record("clean");
        !self.state.borrow().fail_clean
    }

    fn try_reset(&self) -> bool {
        self.record("reset");
        !self.state.borrow().fail_reset
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.state
            .borrow_mut()
            .config
            .insert(key.to_string(), value.to_string());
        self.write_config_file();
        Ok(())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        Ok(self.state.borrow().config.get(key).cloned())
    }

    fn config_exists(&self, key: &str) -> Result<bool, GitError> {
        Ok(self.state.borrow().config.contains_key(key))
    }

    fn try_config_unset(&self, key: &str) -> bool {
        let removed = self.state.borrow_mut().config.remove(key).is_some();
        self.write_config_file();
        removed
    }

    fn set_environment_variable(&mut self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .env
            .insert(name.to_string(), value.to_string());
    }

    fn remove_environment_variable(&mut self, name: &str) {
        self.state.borrow_mut().env.remove(name);
    }

    fn lfs_install(&self) -> Result<(), GitError> {
        self.record("lfs_install");
        Ok(())
    }

    fn lfs_fetch(&self, start_point: &str) -> Result<(), GitError> {
        self.record(format!("lfs_fetch {start_point}"));
        Ok(())
    }

    fn log_last_commit(&self) -> Result<String, GitError> {
        Ok("aaaabbbbccccddddeeeeffff0000111122223333 fake commit".to_string())
    }

    fn try_disable_auto_maintenance(&self) -> bool {
        self.record("disable_auto_maintenance");
        true
    }
}
