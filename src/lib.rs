pub mod cloud_path;
pub mod cloud_provider;
pub mod errors;
pub mod models;
pub mod services;
pub mod webdav_xml_parser;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cloud_path::CloudPath;
pub use cloud_provider::{CloudProvider, CloudProviderExt};
pub use errors::{CloudProviderError, ProviderError, ProviderResult};
pub use models::{CloudItemList, CloudItemMetadata, CloudItemType};
pub use services::local_folder_service::LocalFileSystemProvider;
pub use services::webdav::{WebDAVConfig, WebDAVCredential, WebDAVProvider};
