//! Test doubles for code written against [`CloudProvider`].
//!
//! Only compiled for tests or with the `test-utils` feature.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::cloud_path::CloudPath;
use crate::cloud_provider::CloudProvider;
use crate::errors::{CloudProviderError, ProviderError, ProviderResult};
use crate::models::{CloudItemList, CloudItemMetadata};

/// Provider fake that only understands `create_folder`.
///
/// Creating a folder that is already in `existing_folders` or was created before
/// fails with `ItemAlreadyExists`. Failures for specific paths can be injected.
/// Every other operation fails with a non-canonical "not mocked" error.
#[derive(Debug, Default)]
pub struct FolderRecordingProvider {
    existing_folders: Mutex<Vec<CloudPath>>,
    created_folders: Mutex<Vec<CloudPath>>,
    attempted_folders: Mutex<Vec<CloudPath>>,
    failures: Mutex<HashMap<CloudPath, CloudProviderError>>,
}

impl FolderRecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing_folders<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<CloudPath>,
    {
        let provider = Self::new();
        provider
            .existing_folders
            .lock()
            .unwrap()
            .extend(folders.into_iter().map(Into::into));
        provider
    }

    /// Make `create_folder(path)` fail with `error`.
    pub fn fail_on(&self, path: impl Into<CloudPath>, error: CloudProviderError) {
        self.failures.lock().unwrap().insert(path.into(), error);
    }

    /// Folders created successfully, in call order.
    pub fn created_folders(&self) -> Vec<CloudPath> {
        self.created_folders.lock().unwrap().clone()
    }

    /// Every `create_folder` call, successful or not, in call order.
    pub fn attempted_folders(&self) -> Vec<CloudPath> {
        self.attempted_folders.lock().unwrap().clone()
    }

    fn not_mocked(operation: &str) -> ProviderError {
        ProviderError::Backend(anyhow!("{} is not mocked", operation))
    }
}

#[async_trait]
impl CloudProvider for FolderRecordingProvider {
    async fn fetch_item_metadata(&self, _cloud_path: &CloudPath) -> ProviderResult<CloudItemMetadata> {
        Err(Self::not_mocked("fetch_item_metadata"))
    }

    async fn fetch_item_list(
        &self,
        _cloud_path: &CloudPath,
        _page_token: Option<&str>,
    ) -> ProviderResult<CloudItemList> {
        Err(Self::not_mocked("fetch_item_list"))
    }

    async fn download_file(&self, _cloud_path: &CloudPath, _local_path: &Path) -> ProviderResult<()> {
        Err(Self::not_mocked("download_file"))
    }

    async fn upload_file(
        &self,
        _local_path: &Path,
        _cloud_path: &CloudPath,
        _replace_existing: bool,
    ) -> ProviderResult<CloudItemMetadata> {
        Err(Self::not_mocked("upload_file"))
    }

    async fn create_folder(&self, cloud_path: &CloudPath) -> ProviderResult<()> {
        self.attempted_folders.lock().unwrap().push(cloud_path.clone());

        if let Some(error) = self.failures.lock().unwrap().get(cloud_path) {
            return Err((*error).into());
        }
        let exists = self.existing_folders.lock().unwrap().contains(cloud_path)
            || self.created_folders.lock().unwrap().contains(cloud_path);
        if exists {
            return Err(CloudProviderError::ItemAlreadyExists.into());
        }
        self.created_folders.lock().unwrap().push(cloud_path.clone());
        Ok(())
    }

    async fn delete_item(&self, _cloud_path: &CloudPath) -> ProviderResult<()> {
        Err(Self::not_mocked("delete_item"))
    }

    async fn move_item(&self, _source: &CloudPath, _target: &CloudPath) -> ProviderResult<()> {
        Err(Self::not_mocked("move_item"))
    }
}
