//! The capability interface every storage backend implements.
//!
//! Each operation is a single-shot async computation. Operations are safe to call
//! without checking for existence first; backends that cannot tell files from
//! folders on the wire do the extra verification themselves.

use async_trait::async_trait;
use std::path::Path;

use crate::cloud_path::CloudPath;
use crate::errors::ProviderResult;
use crate::models::{CloudItemList, CloudItemMetadata};

pub mod intermediate_folders;

pub use intermediate_folders::{intermediate_folder_chain, CloudProviderExt};

#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Fetch metadata for a file (`/a/b`) or folder (`/a/b/`).
    ///
    /// Fails `ItemTypeMismatch` when the backend's kind disagrees with the shape of
    /// `cloud_path`.
    async fn fetch_item_metadata(&self, cloud_path: &CloudPath) -> ProviderResult<CloudItemMetadata>;

    /// List the direct children of a folder.
    async fn fetch_item_list(
        &self,
        cloud_path: &CloudPath,
        page_token: Option<&str>,
    ) -> ProviderResult<CloudItemList>;

    /// Download a file to `local_path`, which must not exist yet.
    async fn download_file(&self, cloud_path: &CloudPath, local_path: &Path) -> ProviderResult<()>;

    /// Upload `local_path` to `cloud_path` and return the new item's metadata.
    async fn upload_file(
        &self,
        local_path: &Path,
        cloud_path: &CloudPath,
        replace_existing: bool,
    ) -> ProviderResult<CloudItemMetadata>;

    async fn create_folder(&self, cloud_path: &CloudPath) -> ProviderResult<()>;

    async fn delete_item(&self, cloud_path: &CloudPath) -> ProviderResult<()>;

    /// Move or rename. Never overwrites an existing target.
    async fn move_item(&self, source: &CloudPath, target: &CloudPath) -> ProviderResult<()>;
}
