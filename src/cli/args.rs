use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{model::SyncSettings, secret::Secret};

/// Synchronizes a working directory with a revision of a remote repository.
#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetches and checks out a revision into a directory, reusing it when safe
    Sync(SyncArgs),
    /// Removes credentials left behind by an earlier sync
    Cleanup {
        /// Previously synchronized directory
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Repository owner (organization or user)
    #[clap(long)]
    pub owner: String,
    /// Repository name
    #[clap(long)]
    pub name: String,
    /// Repository host
    #[clap(long, default_value = "github.com")]
    pub host: String,
    /// Directory to synchronize
    #[clap(long)]
    pub path: PathBuf,
    /// Ref to check out: branch, tag, or fully qualified ref
    #[clap(long = "ref")]
    pub reference: Option<String>,
    /// Commit pinning the checkout to an exact object
    #[clap(long)]
    pub commit: Option<String>,
    /// Number of commits to fetch, 0 for full history
    #[clap(long, default_value_t = 1)]
    pub fetch_depth: u32,
    /// Clean the directory before reusing it
    #[clap(long)]
    pub clean: bool,
    /// Enable large file support
    #[clap(long)]
    pub lfs: bool,
    /// Bearer token used for HTTPS fetches
    #[clap(long, env = "REPOSYNC_TOKEN", hide_env_values = true)]
    pub token: String,
    /// SSH private key; the fetch switches to the SSH remote form when set
    #[clap(long, env = "REPOSYNC_SSH_KEY", hide_env_values = true)]
    pub ssh_key: Option<String>,
    /// Extra known-hosts entries to trust for the SSH connection
    #[clap(long, env = "REPOSYNC_SSH_KNOWN_HOSTS")]
    pub ssh_known_hosts: Option<String>,
    /// Verify the remote host key
    #[clap(long)]
    pub ssh_strict: bool,
    /// Keep credentials configured after the sync finishes
    #[clap(long)]
    pub persist_credentials: bool,
}

impl SyncArgs {
    pub fn into_settings(self) -> SyncSettings {
        SyncSettings {
            host: self.host,
            owner: self.owner,
            name: self.name,
            path: self.path,
            reference: self.reference,
            commit: self.commit,
            fetch_depth: self.fetch_depth,
            clean: self.clean,
            lfs: self.lfs,
            ssh_key: self.ssh_key.map(Secret::new),
            ssh_known_hosts: self.ssh_known_hosts,
            ssh_strict: self.ssh_strict,
            auth_token: Secret::new(self.token),
            persist_credentials: self.persist_credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn sync_args_map_into_settings() {
        let args = CliArgs::parse_from([
            "reposync",
            "sync",
            "--owner",
            "org",
            "--name",
            "repo",
            "--path",
            "/work/repo",
            "--ref",
            "refs/heads/main",
            "--fetch-depth",
            "0",
            "--clean",
            "--token",
            "cli-token",
        ]);

        let Command::Sync(sync) = args.cmd else {
            panic!("expected the sync subcommand");
        };
        let settings = sync.into_settings();
        assert_eq!(settings.host, "github.com");
        assert_eq!(settings.owner, "org");
        assert_eq!(settings.name, "repo");
        assert_eq!(settings.path, PathBuf::from("/work/repo"));
        assert_eq!(settings.reference.as_deref(), Some("refs/heads/main"));
        assert_eq!(settings.fetch_depth, 0);
        assert!(settings.clean);
        assert!(!settings.persist_credentials);
        assert_eq!(settings.auth_token.expose(), "cli-token");
    }

    #[test]
    fn cleanup_takes_a_path() {
        let args = CliArgs::parse_from(["reposync", "cleanup", "/work/repo"]);
        let Command::Cleanup { path } = args.cmd else {
            panic!("expected the cleanup subcommand");
        };
        assert_eq!(path, PathBuf::from("/work/repo"));
    }
}
