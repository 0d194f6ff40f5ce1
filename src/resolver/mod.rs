use anyhow::bail;
use regex_lite::Regex;

use crate::git::ORIGIN;

/// Final checkout position: a branch name with its remote-tracking start
/// point, or a directly checked out ref/commit (detached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub target: String,
    pub start_point: Option<String>,
}

impl Checkout {
    fn detached(target: impl Into<String>) -> Checkout {
        Checkout {
            target: target.into(),
            start_point: None,
        }
    }
}

/// Maps a caller-supplied ref/commit pair to concrete fetch and checkout
/// targets.
pub trait RefResolver {
    fn fetch_refspec(
        &self,
        reference: Option<&str>,
        commit: Option<&str>,
    ) -> anyhow::Result<Vec<String>>;

    fn checkout_target(
        &self,
        reference: Option<&str>,
        commit: Option<&str>,
    ) -> anyhow::Result<Checkout>;
}

/// Resolution for the usual ref namespaces: branches, tags, pull heads, bare
/// branch names, and 40-hex commits with no symbolic ref at all.
pub struct StandardRefResolver;

impl RefResolver for StandardRefResolver {
    fn fetch_refspec(
        &self,
        reference: Option<&str>,
        commit: Option<&str>,
    ) -> anyhow::Result<Vec<String>> {
        Ok(match classify(reference, commit)? {
            Target::Commit { commit } => vec![commit],
            Target::Branch { branch, object } => {
                vec![format!("+{object}:refs/remotes/{ORIGIN}/{branch}")]
            }
            Target::Pull { reference, object } => {
                let tracking = reference.replacen("refs/", "refs/remotes/", 1);
                vec![format!("+{object}:{tracking}")]
            }
            Target::Ref { reference, object } => vec![format!("+{object}:{reference}")],
        })
    }

    fn checkout_target(
        &self,
        reference: Option<&str>,
        commit: Option<&str>,
    ) -> anyhow::Result<Checkout> {
        Ok(match classify(reference, commit)? {
            Target::Commit { commit } => Checkout::detached(commit),
            Target::Branch { branch, .. } => Checkout {
                start_point: Some(format!("refs/remotes/{ORIGIN}/{branch}")),
                target: branch,
            },
            Target::Pull { reference, .. } => {
                Checkout::detached(reference.replacen("refs/", "refs/remotes/", 1))
            }
            Target::Ref { reference, .. } => Checkout::detached(reference),
        })
    }
}

enum Target {
    /// No symbolic ref; the commit is fetched and checked out directly.
    Commit { commit: String },
    /// `refs/heads/*`, or a bare name normalized into it.
    Branch { branch: String, object: String },
    /// `refs/pull/*`, mapped into the remote-tracking namespace.
    Pull { reference: String, object: String },
    /// Any other fully qualified ref, e.g. `refs/tags/*`.
    Ref { reference: String, object: String },
}

fn classify(reference: Option<&str>, commit: Option<&str>) -> anyhow::Result<Target> {
    let reference = reference.map(str::trim).filter(|r| !r.is_empty());
    let commit = commit.map(str::trim).filter(|c| !c.is_empty());

    let Some(reference) = reference else {
        let Some(commit) = commit else {
            bail!("A ref or a commit must be provided to resolve a checkout target");
        };
        return Ok(Target::Commit {
            commit: commit.to_string(),
        });
    };

    // A bare 40-hex ref with no commit is a commit in disguise.
    if commit.is_none() && is_commit_hash(reference) {
        return Ok(Target::Commit {
            commit: reference.to_string(),
        });
    }

    // The commit, when present, pins what the refspec fetches; the ref only
    // names where it lands.
    let object = commit.unwrap_or(reference).to_string();

    if let Some(branch) = reference.strip_prefix("refs/heads/") {
        Ok(Target::Branch {
            branch: branch.to_string(),
            object,
        })
    } else if reference.starts_with("refs/pull/") {
        Ok(Target::Pull {
            reference: reference.to_string(),
            object,
        })
    } else if reference.starts_with("refs/") {
        Ok(Target::Ref {
            reference: reference.to_string(),
            object,
        })
    } else {
        // Unqualified names are treated as branches.
        Ok(Target::Branch {
            branch: reference.to_string(),
            object,
        })
    }
}

fn is_commit_hash(reference: &str) -> bool {
    let re = Regex::new(r"^[0-9a-f]{40}$").unwrap();
    re.is_match(reference)
}
