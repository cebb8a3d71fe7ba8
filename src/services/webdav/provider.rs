use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use super::config::WebDAVConfig;
use super::connection::{PropfindDepth, WebDAVConnection};
use crate::cloud_path::CloudPath;
use crate::cloud_provider::CloudProvider;
use crate::errors::{
    CloudProviderError, ProviderError, ProviderResult, WebDavError, WebDavTransportError,
};
use crate::models::{CloudItemList, CloudItemMetadata, CloudItemType};
use crate::services::staging::{persist_staged, stage_next_to};
use crate::webdav_xml_parser::{last_path_segment, parse_propfind_response, PropfindResponseElement};

type StatusMap = &'static [(u16, CloudProviderError)];

const FETCH_STATUS_MAP: StatusMap = &[
    (401, CloudProviderError::Unauthorized),
    (404, CloudProviderError::ItemNotFound),
];

const UPLOAD_STATUS_MAP: StatusMap = &[
    (401, CloudProviderError::Unauthorized),
    (405, CloudProviderError::ItemTypeMismatch),
    (409, CloudProviderError::ParentFolderDoesNotExist),
    (507, CloudProviderError::QuotaInsufficient),
];

const CREATE_FOLDER_STATUS_MAP: StatusMap = &[
    (401, CloudProviderError::Unauthorized),
    (405, CloudProviderError::ItemAlreadyExists),
    (409, CloudProviderError::ParentFolderDoesNotExist),
    (507, CloudProviderError::QuotaInsufficient),
];

const DELETE_STATUS_MAP: StatusMap = &[
    (401, CloudProviderError::Unauthorized),
    (404, CloudProviderError::ItemNotFound),
];

const MOVE_STATUS_MAP: StatusMap = &[
    (401, CloudProviderError::Unauthorized),
    (404, CloudProviderError::ItemNotFound),
    (409, CloudProviderError::ParentFolderDoesNotExist),
    (412, CloudProviderError::ItemAlreadyExists),
    (507, CloudProviderError::QuotaInsufficient),
];

/// Translates a transport failure using one operation's status table.
///
/// Statuses missing from the table stay adapter-internal.
fn classify(error: WebDavTransportError, status_map: StatusMap) -> ProviderError {
    match error {
        WebDavTransportError::Status(status) => {
            match status_map.iter().find(|(code, _)| *code == status) {
                Some((_, kind)) => {
                    debug!("HTTP {} classified as {:?}", status, kind);
                    ProviderError::Cloud(*kind)
                }
                None => {
                    warn!("Unmapped HTTP status {}", status);
                    WebDavError::Http { status }.into()
                }
            }
        }
        WebDavTransportError::Connectivity(e) => {
            debug!("Connectivity lost: {}", e);
            CloudProviderError::NoInternetConnection.into()
        }
        other => {
            warn!("WebDAV request failed: {}", other);
            WebDavError::from(other).into()
        }
    }
}

fn item_type(element: &PropfindResponseElement) -> CloudItemType {
    match element.collection {
        Some(true) => CloudItemType::Folder,
        Some(false) => CloudItemType::File,
        None => CloudItemType::Unknown,
    }
}

fn metadata_from_element(element: &PropfindResponseElement, cloud_path: CloudPath) -> CloudItemMetadata {
    CloudItemMetadata::new(
        cloud_path,
        item_type(element),
        element.last_modified,
        element.content_length,
    )
}

/// The server's kind has to agree with the trailing-separator shape of the path.
/// `Unknown` is accepted for either shape.
fn validate_item_type(cloud_path: &CloudPath, item_type: CloudItemType) -> bool {
    !matches!(
        (cloud_path.has_directory_path(), item_type),
        (true, CloudItemType::File) | (false, CloudItemType::Folder)
    )
}

/// WebDAV implementation of [`CloudProvider`].
///
/// Plain WebDAV verbs cannot tell files from folders, so GET, PUT, DELETE and MOVE
/// are each preceded by a depth-0 PROPFIND that checks what is actually there.
pub struct WebDAVProvider {
    connection: WebDAVConnection,
}

impl WebDAVProvider {
    pub fn new(config: &WebDAVConfig) -> anyhow::Result<Self> {
        Ok(Self::with_connection(WebDAVConnection::new(config)?))
    }

    pub fn with_connection(connection: WebDAVConnection) -> Self {
        Self { connection }
    }

    /// Checks that the base URL speaks WebDAV class 1 and that the credential is
    /// accepted for a PROPFIND on it.
    pub async fn check_server_compatibility(&self) -> ProviderResult<()> {
        let base_url = self.connection.url_manager().base_url().clone();
        info!("🔍 Checking WebDAV server compatibility at {}", base_url);

        let response = self
            .connection
            .options(&base_url)
            .await
            .map_err(|e| classify(e, FETCH_STATUS_MAP))?;
        let dav_classes = response
            .headers()
            .get("dav")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !dav_classes.split(',').any(|class| class.trim() == "1") {
            return Err(WebDavError::InvalidResponse(format!(
                "server does not advertise DAV class 1 (DAV: '{}')",
                dav_classes
            ))
            .into());
        }

        self.connection
            .propfind(&base_url, PropfindDepth::Zero)
            .await
            .map_err(|e| classify(e, FETCH_STATUS_MAP))?;

        info!("✅ WebDAV server is compatible (DAV: {})", dav_classes);
        Ok(())
    }

    async fn fetch_elements(
        &self,
        cloud_path: &CloudPath,
        depth: PropfindDepth,
    ) -> ProviderResult<Vec<PropfindResponseElement>> {
        let url = self.connection.url_manager().resolve(cloud_path)?;
        let (response_url, body) = self
            .connection
            .propfind(&url, depth)
            .await
            .map_err(|e| classify(e, FETCH_STATUS_MAP))?;
        Ok(parse_propfind_response(&body, &response_url)?)
    }

    async fn write_response_to(&self, response: reqwest::Response, local_path: &Path) -> ProviderResult<()> {
        let (temp_file, mut file) = stage_next_to(local_path)?;

        let mut response = response;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify(e.into(), FETCH_STATUS_MAP))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        persist_staged(temp_file, local_path).await
    }
}

#[async_trait]
impl CloudProvider for WebDAVProvider {
    async fn fetch_item_metadata(&self, cloud_path: &CloudPath) -> ProviderResult<CloudItemMetadata> {
        let elements = self.fetch_elements(cloud_path, PropfindDepth::Zero).await?;
        let element = elements
            .iter()
            .find(|element| element.depth == 0)
            .ok_or_else(|| WebDavError::InvalidResponse("no depth-0 element".to_string()))?;

        let metadata = metadata_from_element(element, cloud_path.clone());
        if !validate_item_type(cloud_path, metadata.item_type) {
            debug!("{} is a {} on the server", cloud_path, metadata.item_type);
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
        // WebDAV listings come back in one piece, so no token was ever handed out.
        if page_token.is_some() {
            return Err(CloudProviderError::PageTokenInvalid.into());
        }

        let elements = self.fetch_elements(cloud_path, PropfindDepth::One).await?;
        let root = elements
            .iter()
            .find(|element| element.depth == 0)
            .ok_or_else(|| WebDavError::InvalidResponse("no depth-0 element".to_string()))?;
        if item_type(root) != CloudItemType::Folder {
            return Err(CloudProviderError::ItemTypeMismatch.into());
        }

        let items: Vec<CloudItemMetadata> = elements
            .iter()
            .filter(|element| element.depth == 1)
            .map(|element| {
                let name = last_path_segment(&element.url);
                let child_path = if element.collection == Some(true) {
                    cloud_path.appending_path_component(&format!("{}/", name))
                } else {
                    cloud_path.appending_path_component(&name)
                };
                metadata_from_element(element, child_path)
            })
            .collect();

        debug!("Listed {} items in {}", items.len(), cloud_path);
        Ok(CloudItemList::new(items, None))
    }

    async fn download_file(&self, cloud_path: &CloudPath, local_path: &Path) -> ProviderResult<()> {
        if cloud_path.has_directory_path() {
            return Err(ProviderError::invalid_argument(format!(
                "cannot download '{}': not a file path",
                cloud_path
            )));
        }
        let url = self.connection.url_manager().resolve(cloud_path)?;

        // GET on a collection does not reliably fail, so check what is there first.
        self.fetch_item_metadata(cloud_path).await?;

        let response = self
            .connection
            .get(&url)
            .await
            .map_err(|e| classify(e, FETCH_STATUS_MAP))?;
        self.write_response_to(response, local_path).await?;

        debug!("⬇️ Downloaded {} to {}", cloud_path, local_path.display());
        Ok(())
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
        let url = self.connection.url_manager().resolve(cloud_path)?;

        let size = match tokio::fs::metadata(local_path).await {
            Ok(local) if local.is_dir() => return Err(CloudProviderError::ItemTypeMismatch.into()),
            Ok(local) => local.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CloudProviderError::ItemNotFound.into())
            }
            Err(e) => return Err(e.into()),
        };

        // PUT silently overwrites, so existence decides replace_existing here.
        match self.fetch_item_metadata(cloud_path).await {
            Ok(_) if !replace_existing => return Err(CloudProviderError::ItemAlreadyExists.into()),
            Ok(_) => {}
            Err(e) if e.is(CloudProviderError::ItemNotFound) => {}
            Err(e) if e.is(CloudProviderError::ItemTypeMismatch) && !replace_existing => {
                return Err(CloudProviderError::ItemAlreadyExists.into())
            }
            Err(e) => return Err(e),
        }

        let file = tokio::fs::File::open(local_path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        self.connection
            .put(&url, body, size)
            .await
            .map_err(|e| classify(e, UPLOAD_STATUS_MAP))?;
        debug!("⬆️ Uploaded {} bytes to {}", size, cloud_path);

        self.fetch_item_metadata(cloud_path).await
    }

    async fn create_folder(&self, cloud_path: &CloudPath) -> ProviderResult<()> {
        let url = self.connection.url_manager().resolve_folder(cloud_path)?;
        self.connection
            .mkcol(&url)
            .await
            .map_err(|e| classify(e, CREATE_FOLDER_STATUS_MAP))?;
        debug!("📁 Created folder {}", cloud_path);
        Ok(())
    }

    async fn delete_item(&self, cloud_path: &CloudPath) -> ProviderResult<()> {
        let url = self.connection.url_manager().resolve(cloud_path)?;

        // DELETE does not care whether it hits a file or a collection.
        self.fetch_item_metadata(cloud_path).await?;

        self.connection
            .delete(&url)
            .await
            .map_err(|e| classify(e, DELETE_STATUS_MAP))?;
        debug!("🗑️ Deleted {}", cloud_path);
        Ok(())
    }

    async fn move_item(&self, source: &CloudPath, target: &CloudPath) -> ProviderResult<()> {
        if source.has_directory_path() != target.has_directory_path() {
            return Err(ProviderError::invalid_argument(format!(
                "cannot move '{}' to '{}': file and folder paths mixed",
                source, target
            )));
        }
        let source_url = self.connection.url_manager().resolve(source)?;
        let target_url = self.connection.url_manager().resolve(target)?;

        // MOVE does not care whether it hits a file or a collection.
        self.fetch_item_metadata(source).await?;

        self.connection
            .move_resource(&source_url, &target_url)
            .await
            .map_err(|e| classify(e, MOVE_STATUS_MAP))?;
        debug!("Moved {} to {}", source, target);
        Ok(())
    }
}
