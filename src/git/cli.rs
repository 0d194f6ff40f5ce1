use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use log::{debug, trace};
use regex_lite::Regex;

use crate::secret::scrub;

use super::{GitClient, GitError, GitVersion, MINIMUM_GIT_VERSION, ORIGIN};

/// A git client bound to one working directory, driving the `git` binary.
///
/// Every invocation inherits the environment variables accumulated through
/// [`GitClient::set_environment_variable`]; command lines and stderr are
/// passed through the redaction registry before they reach a log or an error.
pub struct GitCli {
    git_path: PathBuf,
    work_dir: PathBuf,
    env: HashMap<String, String>,
    version: GitVersion,
}

impl GitCli {
    /// Binds a client to `work_dir`, probing the binary's version against
    /// [`MINIMUM_GIT_VERSION`]. The directory must already exist.
    pub fn bind(git_path: &Path, work_dir: &Path) -> Result<GitCli, GitError> {
        let version = probe_version(git_path)?;
        if version < MINIMUM_GIT_VERSION {
            return Err(GitError::UnsupportedVersion {
                found: version,
                minimum: MINIMUM_GIT_VERSION,
            });
        }
        debug!("Bound git {} to {}", version, work_dir.display());
        Ok(GitCli {
            git_path: git_path.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            env: HashMap::new(),
            version,
        })
    }

    pub fn try_bind(git_path: &Path, work_dir: &Path) -> Option<GitCli> {
        match Self::bind(git_path, work_dir) {
            Ok(git) => Some(git),
            Err(error) => {
                debug!("Could not bind a git client: {error}");
                None
            }
        }
    }

    pub fn version(&self) -> GitVersion {
        self.version
    }

    /// Verifies that the `git lfs` extension answers a version probe.
    pub fn ensure_lfs(&self) -> Result<(), GitError> {
        self.exec(&["lfs", "version"])
            .map(|_| ())
            .map_err(|error| GitError::LfsUnavailable(error.to_string()))
    }

    /// Runs git and maps a non-zero exit status to an error.
    fn exec(&self, args: &[&str]) -> Result<Output, GitError> {
        let (output, command) = self.exec_unchecked(args)?;
        if !output.status.success() {
            return Err(GitError::Exit {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: scrub(String::from_utf8_lossy(&output.stderr).trim()),
            });
        }
        Ok(output)
    }

    /// Runs git and reports the raw outcome; some operations use the exit
    /// status as an answer rather than a failure.
    fn exec_unchecked(&self, args: &[&str]) -> Result<(Output, String), GitError> {
        let command = scrub(&format!("{} {}", self.git_path.display(), args.join(" ")));
        trace!("Running `{command}` in {}", self.work_dir.display());
        let output = Command::new(&self.git_path)
            .args(args)
            .current_dir(&self.work_dir)
            .envs(&self.env)
            .output()
            .map_err(|source| GitError::Spawn {
                binary: self.git_path.display().to_string(),
                source,
            })?;
        Ok((output, command))
    }

    fn stdout(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.exec(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitClient for GitCli {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn init(&self) -> Result<(), GitError> {
        self.exec(&["init"]).map(|_| ())
    }

    fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.exec(&["remote", "add", name, url]).map(|_| ())
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        self.config_get(&format!("remote.{name}.url"))
    }

    fn fetch(&self, refspec: &[String], depth: u32) -> Result<(), GitError> {
        let mut args = vec![
            "-c".to_string(),
            "protocol.version=2".to_string(),
            "fetch".to_string(),
            "--no-tags".to_string(),
            "--prune".to_string(),
            "--no-recurse-submodules".to_string(),
        ];
        if depth > 0 {
            args.push(format!("--depth={depth}"));
        } else if self.work_dir.join(".git").join("shallow").exists() {
            args.push("--unshallow".to_string());
        }
        args.push(ORIGIN.to_string());
        args.extend(refspec.iter().cloned());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.exec(&args).map(|_| ())
    }

    fn checkout(&self, target: &str, start_point: Option<&str>) -> Result<(), GitError> {
        match start_point {
            Some(start_point) => self
                .exec(&["checkout", "--force", "-B", target, start_point])
                .map(|_| ()),
            None => self.exec(&["checkout", "--force", target]).map(|_| ()),
        }
    }

    fn detach_head(&self) -> Result<(), GitError> {
        self.exec(&["checkout", "--detach"]).map(|_| ())
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        // symbolic-ref resolves only when HEAD points at a branch.
        let (output, _) = self.exec_unchecked(&["symbolic-ref", "--quiet", "HEAD"])?;
        Ok(!output.status.success())
    }

    fn branch_list(&self, remote: bool) -> Result<Vec<String>, GitError> {
        let namespace = if remote { "refs/remotes" } else { "refs/heads" };
        let stdout = self.stdout(&["for-each-ref", "--format=%(refname:short)", namespace])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn branch_delete(&self, remote: bool, name: &str) -> Result<(), GitError> {
        if remote {
            self.exec(&["branch", "--delete", "--force", "--remotes", name])
                .map(|_| ())
        } else {
            self.exec(&["branch", "--delete", "--force", name]).map(|_| ())
        }
    }

    fn try_clean(&self) -> bool {
        self.exec(&["clean", "-ffdx"]).is_ok()
    }

    fn try_reset(&self) -> bool {
        self.exec(&["reset", "--hard", "HEAD"]).is_ok()
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.exec(&["config", "--local", key, value]).map(|_| ())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        let (output, command) = self.exec_unchecked(&["config", "--local", "--get", key])?;
        match output.status.code() {
            Some(0) => Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            )),
            // git reports an unset key with exit code 1.
            Some(1) => Ok(None),
            code => Err(GitError::Exit {
                command,
                code: code.unwrap_or(-1),
                stderr: scrub(String::from_utf8_lossy(&output.stderr).trim()),
            }),
        }
    }

    fn config_exists(&self, key: &str) -> Result<bool, GitError> {
        Ok(self.config_get(key)?.is_some())
    }

    fn try_config_unset(&self, key: &str) -> bool {
        self.exec(&["config", "--local", "--unset-all", key]).is_ok()
    }

    fn set_environment_variable(&mut self, name: &str, value: &str) {
        self.env.insert(name.to_string(), value.to_string());
    }

    fn remove_environment_variable(&mut self, name: &str) {
        self.env.remove(name);
    }

    fn lfs_install(&self) -> Result<(), GitError> {
        self.exec(&["lfs", "install", "--local"]).map(|_| ())
    }

    fn lfs_fetch(&self, start_point: &str) -> Result<(), GitError> {
        self.exec(&["lfs", "fetch", ORIGIN, start_point]).map(|_| ())
    }

    fn log_last_commit(&self) -> Result<String, GitError> {
        self.stdout(&["log", "-1", "--format=%H %s"])
    }

    fn try_disable_auto_maintenance(&self) -> bool {
        // Background maintenance racing the fetch only costs time, never
        // correctness, so callers treat a failure here as a warning.
        self.config_set("maintenance.auto", "false").is_ok()
            && self.config_set("gc.auto", "0").is_ok()
    }
}

fn probe_version(git_path: &Path) -> Result<GitVersion, GitError> {
    let output = Command::new(git_path)
        .arg("version")
        .output()
        .map_err(|source| GitError::Spawn {
            binary: git_path.display().to_string(),
            source,
        })?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        return Err(GitError::UnknownVersion {
            binary: git_path.display().to_string(),
            output: stdout.trim().to_string(),
        });
    }
    parse_version(&stdout).ok_or_else(|| GitError::UnknownVersion {
        binary: git_path.display().to_string(),
        output: stdout.trim().to_string(),
    })
}

fn parse_version(output: &str) -> Option<GitVersion> {
    let re = Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap();
    let captures = re.captures(output)?;
    let part = |index: usize| {
        captures
            .get(index)
            .map_or(Some(0), |m| m.as_str().parse().ok())
    };
    Some(GitVersion {
        major: part(1)?,
        minor: part(2)?,
        patch: part(3)?,
    })
}
