use async_trait::async_trait;
use tracing::debug;

use super::CloudProvider;
use crate::cloud_path::CloudPath;
use crate::errors::{CloudProviderError, ProviderResult};

/// Ordered ancestor chain from the first real segment down to `target` inclusive.
///
/// Every element keeps the target's shape: `/Foo/Bar` yields `/Foo`, `/Foo/Bar`,
/// while `/Foo/Bar/` yields `/Foo/`, `/Foo/Bar/`. The root and the empty path yield
/// nothing.
pub fn intermediate_folder_chain(target: &CloudPath) -> Vec<CloudPath> {
    if target.is_root() {
        return Vec::new();
    }
    let folder_shaped = target.has_directory_path();
    let mut current = CloudPath::new("");
    let mut chain = Vec::new();
    for component in target.path_components() {
        match component.as_str() {
            "" => continue,
            "/" => current = CloudPath::new("/"),
            _ => {
                current = current.appending_path_component(&component);
                chain.push(if folder_shaped {
                    CloudPath::new(format!("{}/", current))
                } else {
                    current.clone()
                });
            }
        }
    }
    chain
}

#[async_trait]
pub trait CloudProviderExt: CloudProvider {
    /// Ensure `cloud_path` exists as a folder, creating missing ancestors first.
    ///
    /// Folders are created strictly one after another. `ItemAlreadyExists` on any
    /// step is tolerated; every other failure aborts the chain unchanged.
    async fn create_folder_with_intermediates(&self, cloud_path: &CloudPath) -> ProviderResult<()> {
        for folder in intermediate_folder_chain(cloud_path) {
            match self.create_folder(&folder).await {
                Ok(()) => debug!("Created folder {}", folder),
                Err(e) if e.is(CloudProviderError::ItemAlreadyExists) => {
                    debug!("Folder {} already exists, continuing", folder);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<T: CloudProvider + ?Sized> CloudProviderExt for T {}
