use std::{fs, io, path::Path};

use log::{info, warn};

use crate::{
    git::{GitClient, ORIGIN},
    model::DirectoryDisposition,
};

/// Lock artifacts a crashed prior run can leave under `.git`.
const STALE_LOCKS: &[&str] = &["index.lock", "shallow.lock"];

/// Decides the fate of a pre-existing working directory.
///
/// A client-less sync always starts from an empty directory, because the
/// archive fallback materializes a full tree itself. A directory without
/// metadata, or bound to a different remote, is a stale or foreign checkout.
pub fn decide(
    client_available: bool,
    metadata_present: bool,
    url_matches: bool,
    clean: bool,
) -> DirectoryDisposition {
    if !client_available || !metadata_present || !url_matches {
        DirectoryDisposition::Discard
    } else if clean {
        DirectoryDisposition::ResetAndReuse
    } else {
        DirectoryDisposition::Reuse
    }
}

/// Inspects an existing directory and brings it into a reusable state, or
/// empties it when its contents cannot be trusted.
///
/// Reconciliation failures never propagate; they downgrade the disposition to
/// [`DirectoryDisposition::Discard`]. Only the final deletion of the
/// directory contents can fail the call.
pub fn prepare(
    git: Option<&dyn GitClient>,
    path: &Path,
    expected_url: &str,
    clean: bool,
) -> io::Result<DirectoryDisposition> {
    let metadata_present = path.join(".git").is_dir();
    let url_matches = match git {
        Some(git) if metadata_present => {
            git.remote_url(ORIGIN).ok().flatten().as_deref() == Some(expected_url)
        }
        _ => false,
    };

    let mut disposition = decide(git.is_some(), metadata_present, url_matches, clean);

    if disposition != DirectoryDisposition::Discard {
        if let Some(git) = git {
            disposition = match reconcile(git, path, clean) {
                Ok(disposition) => disposition,
                Err(error) => {
                    info!(
                        "Unable to prepare the existing directory for reuse: {error}. \
                         The contents will be recreated."
                    );
                    DirectoryDisposition::Discard
                }
            };
        }
    }

    if disposition == DirectoryDisposition::Discard {
        info!("Deleting the contents of {}", path.display());
        empty_directory(path)?;
    }

    Ok(disposition)
}

fn reconcile(
    git: &dyn GitClient,
    path: &Path,
    clean: bool,
) -> anyhow::Result<DirectoryDisposition> {
    remove_stale_locks(path);

    if !git.is_detached()? {
        git.detach_head()?;
    }

    // Stale refs in either namespace would conflict with the upcoming fetch.
    // Each namespace gets its own deletion call; a single pass over the
    // enumerated names is deliberate.
    for branch in git.branch_list(false)? {
        git.branch_delete(false, &branch)?;
    }
    let remote_prefix = format!("{ORIGIN}/");
    for branch in git.branch_list(true)? {
        if branch.starts_with(&remote_prefix) {
            git.branch_delete(true, &branch)?;
        }
    }

    if clean {
        if !git.try_clean() {
            info!(
                "Unable to clean the repository at {}. Delete its contents manually if this \
                 persists. The contents will be recreated.",
                path.display()
            );
            return Ok(DirectoryDisposition::Discard);
        }
        if !git.try_reset() {
            info!(
                "Unable to reset the repository at {}. The contents will be recreated.",
                path.display()
            );
            return Ok(DirectoryDisposition::Discard);
        }
        return Ok(DirectoryDisposition::ResetAndReuse);
    }

    Ok(DirectoryDisposition::Reuse)
}

fn remove_stale_locks(path: &Path) {
    for name in STALE_LOCKS {
        let lock = path.join(".git").join(name);
        match fs::remove_file(&lock) {
            Ok(()) => info!("Removed stale lock file {}", lock.display()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!("Could not remove {}: {error}", lock.display()),
        }
    }
}

/// Deletes every entry inside `path`, leaving the directory itself in place.
/// The directory may be the process's working directory, so it is never
/// removed.
pub fn empty_directory(path: &Path) -> io::Result<()> {
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
