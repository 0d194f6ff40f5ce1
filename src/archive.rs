use std::path::Path;

use crate::{model::RepositorySource, secret::Secret};

/// Materializes a tree at a revision without any local revision-control
/// client, typically through a hosting service's archive API.
///
/// This crate ships no HTTP transport; callers inject an implementation.
/// When no client binary is usable and no downloader was injected, a sync
/// that needs the fallback fails with a descriptive error.
pub trait ArchiveDownloader {
    fn download(
        &self,
        auth_token: &Secret,
        source: &RepositorySource,
        reference: Option<&str>,
        commit: Option<&str>,
        destination: &Path,
    ) -> anyhow::Result<()>;
}
