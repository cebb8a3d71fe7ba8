use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::{CloudProviderError, ProviderError, ProviderResult};

/// Temp file next to `destination`, so persisting it is a same-filesystem rename.
pub(crate) fn stage_next_to(destination: &Path) -> ProviderResult<(NamedTempFile, tokio::fs::File)> {
    let parent = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp_file = NamedTempFile::new_in(parent)?;
    let file = tokio::fs::File::from_std(temp_file.reopen()?);
    Ok((temp_file, file))
}

/// Moves a fully written temp file to `destination` without replacing anything.
///
/// An occupied destination fails with `ItemAlreadyExists` and is left untouched.
/// The temp file is removed on every failure path.
pub(crate) async fn persist_staged(temp_file: NamedTempFile, destination: &Path) -> ProviderResult<()> {
    let target: PathBuf = destination.to_path_buf();
    let persisted = tokio::task::spawn_blocking(move || temp_file.persist_noclobber(&target))
        .await
        .map_err(|e| ProviderError::Backend(anyhow::Error::new(e)))?;
    match persisted {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            Err(CloudProviderError::ItemAlreadyExists.into())
        }
        Err(e) => Err(e.error.into()),
    }
}
