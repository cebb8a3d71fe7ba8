use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::cloud_path::CloudPath;
use crate::cloud_provider::CloudProvider;
use crate::errors::{CloudProviderError, ProviderError, ProviderResult};
use crate::models::{CloudItemList, CloudItemMetadata, CloudItemType};
use crate::services::staging::{persist_staged, stage_next_to};

/// [`CloudProvider`] over a directory on the local file system.
///
/// Cloud paths are interpreted relative to `root`; a leading separator is ignored.
#[derive(Debug, Clone)]
pub struct LocalFileSystemProvider {
    root: PathBuf,
}

fn item_type_of(metadata: &Metadata) -> CloudItemType {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        CloudItemType::Symlink
    } else if file_type.is_dir() {
        CloudItemType::Folder
    } else if file_type.is_file() {
        CloudItemType::File
    } else {
        CloudItemType::Unknown
    }
}

fn to_cloud_metadata(metadata: &Metadata, cloud_path: CloudPath) -> CloudItemMetadata {
    let item_type = item_type_of(metadata);
    let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let size = (item_type == CloudItemType::File).then(|| metadata.len());
    CloudItemMetadata::new(cloud_path, item_type, last_modified, size)
}

fn shape_matches(cloud_path: &CloudPath, item_type: CloudItemType) -> bool {
    !matches!(
        (cloud_path.has_directory_path(), item_type),
        (true, CloudItemType::File) | (false, CloudItemType::Folder)
    )
}

/// `NotFound` becomes `not_found`, `AlreadyExists` becomes `ItemAlreadyExists`,
/// anything else stays an opaque IO failure.
fn classify_io(error: std::io::Error, not_found: CloudProviderError) -> ProviderError {
    match error.kind() {
        ErrorKind::NotFound => not_found.into(),
        ErrorKind::AlreadyExists => CloudProviderError::ItemAlreadyExists.into(),
        _ => error.into(),
    }
}

async fn exists(path: &Path) -> ProviderResult<bool> {
    Ok(fs::try_exists(path).await?)
}

async fn parent_is_folder(path: &Path) -> bool {
    match path.parent() {
        Some(parent) => fs::metadata(parent).await.map(|m| m.is_dir()).unwrap_or(false),
        None => false,
    }
}

impl LocalFileSystemProvider {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(anyhow!("Root folder does not exist: {}", root.display()));
        }
        if !root.is_dir() {
            return Err(anyhow!("Root folder is not a directory: {}", root.display()));
        }
        info!("Using local folder {} as cloud root", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn local_path(&self, cloud_path: &CloudPath) -> ProviderResult<PathBuf> {
        let escapes_root = cloud_path
            .standardized()
            .path_components()
            .iter()
            .any(|component| component == "..");
        if escapes_root {
            return Err(ProviderError::invalid_argument(format!(
                "'{}' points outside of the root folder",
                cloud_path
            )));
        }
        // The shape is checked against the item kind, never by the file system.
        let relative = cloud_path.as_str().trim_matches('/');
        Ok(self.root.join(relative))
    }

    async fn validate_local_source(local_path: &Path) -> ProviderResult<()> {
        match fs::metadata(local_path).await {
            Ok(metadata) if metadata.is_dir() => Err(CloudProviderError::ItemTypeMismatch.into()),
            Ok(_) => Ok(()),
            Err(e) => Err(classify_io(e, CloudProviderError::ItemNotFound)),
        }
    }
}

#[async_trait]
impl CloudProvider for LocalFileSystemProvider {
    async fn fetch_item_metadata(&self, cloud_path: &CloudPath) -> ProviderResult<CloudItemMetadata> {
        let path = self.local_path(cloud_path)?;
        let metadata = fs::symlink_metadata(&path)
            .await
            .map_err(|e| classify_io(e, CloudProviderError::ItemNotFound))?;
        let metadata = to_cloud_metadata(&metadata, cloud_path.clone());
        if !shape_matches(cloud_path, metadata.item_type) {
            return Err(CloudProviderError::ItemTypeMismatch.into());
        }
        Ok(metadata)
    }

    async fn fetch_item_list(
        &self,
        cloud_path: &CloudPath,
        page_token: Option<&str>,
    ) -> ProviderResult<CloudItemList> {
        if !cloud_path.has_directory_path() {
            return Err(ProviderError::invalid_argument(format!(
                "cannot list '{}': not a folder path",
                cloud_path
            )));
        }
        if page_token.is_some() {
            return Err(CloudProviderError::PageTokenInvalid.into());
        }
        let folder = self.fetch_item_metadata(cloud_path).await?;
        if folder.item_type != CloudItemType::Folder {
            return Err(CloudProviderError::ItemTypeMismatch.into());
        }

        let mut entries = fs::read_dir(self.local_path(cloud_path)?).await?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = fs::symlink_metadata(entry.path()).await?;
            let child_path = if metadata.is_dir() {
                cloud_path.appending_path_component(&format!("{}/", name))
            } else {
                cloud_path.appending_path_component(&name)
            };
            items.push(to_cloud_metadata(&metadata, child_path));
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("Listed {} items in {}", items.len(), cloud_path);
        Ok(CloudItemList::new(items, None))
    }

    async fn download_file(&self, cloud_path: &CloudPath, local_path: &Path) -> ProviderResult<()> {
        let source = self.local_path(cloud_path)?;
        let metadata = self.fetch_item_metadata(cloud_path).await?;
        if metadata.item_type != CloudItemType::File {
            return Err(CloudProviderError::ItemTypeMismatch.into());
        }

        let mut reader = fs::File::open(&source)
            .await
            .map_err(|e| classify_io(e, CloudProviderError::ItemNotFound))?;
        let (temp_file, mut writer) = stage_next_to(local_path)?;
        tokio::io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;
        drop(writer);

        persist_staged(temp_file, local_path).await
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        cloud_path: &CloudPath,
        replace_existing: bool,
    ) -> ProviderResult<CloudItemMetadata> {
        if cloud_path.has_directory_path() {
            return Err(ProviderError::invalid_argument(format!(
                "cannot upload to '{}': not a file path",
                cloud_path
            )));
        }
        let target = self.local_path(cloud_path)?;
        Self::validate_local_source(local_path).await?;

        match self.fetch_item_metadata(cloud_path).await {
            Ok(_) if !replace_existing => return Err(CloudProviderError::ItemAlreadyExists.into()),
            Ok(_) => {}
            Err(e) if e.is(CloudProviderError::ItemNotFound) => {}
            Err(e) if e.is(CloudProviderError::ItemTypeMismatch) && !replace_existing => {
                return Err(CloudProviderError::ItemAlreadyExists.into())
            }
            Err(e) => return Err(e),
        }
        if !parent_is_folder(&target).await {
            return Err(CloudProviderError::ParentFolderDoesNotExist.into());
        }

        fs::copy(local_path, &target).await?;
        self.fetch_item_metadata(cloud_path).await
    }

    async fn create_folder(&self, cloud_path: &CloudPath) -> ProviderResult<()> {
        let path = self.local_path(cloud_path)?;
        fs::create_dir(&path)
            .await
            .map_err(|e| classify_io(e, CloudProviderError::ParentFolderDoesNotExist))?;
        debug!("📁 Created folder {}", cloud_path);
        Ok(())
    }

    async fn delete_item(&self, cloud_path: &CloudPath) -> ProviderResult<()> {
        let path = self.local_path(cloud_path)?;
        let metadata = self.fetch_item_metadata(cloud_path).await?;
        let removed = if metadata.item_type == CloudItemType::Folder {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|e| classify_io(e, CloudProviderError::ItemNotFound))
    }

    async fn move_item(&self, source: &CloudPath, target: &CloudPath) -> ProviderResult<()> {
        if source.has_directory_path() != target.has_directory_path() {
            return Err(ProviderError::invalid_argument(format!(
                "cannot move '{}' to '{}': file and folder paths mixed",
                source, target
            )));
        }
        let source_path = self.local_path(source)?;
        let target_path = self.local_path(target)?;

        self.fetch_item_metadata(source).await?;
        if exists(&target_path).await? {
            return Err(CloudProviderError::ItemAlreadyExists.into());
        }
        if !parent_is_folder(&target_path).await {
            return Err(CloudProviderError::ParentFolderDoesNotExist.into());
        }

        fs::rename(&source_path, &target_path)
            .await
            .map_err(|e| classify_io(e, CloudProviderError::ItemNotFound))
    }
}
