use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cloud_path::CloudPath;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CloudItemType {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "folder")]
    Folder,
    #[serde(rename = "symlink")]
    Symlink,
    #[serde(rename = "unknown")]
    Unknown,
}

impl std::fmt::Display for CloudItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudItemType::File => write!(f, "file"),
            CloudItemType::Folder => write!(f, "folder"),
            CloudItemType::Symlink => write!(f, "symlink"),
            CloudItemType::Unknown => write!(f, "unknown"),
        }
    }
}

impl TryFrom<String> for CloudItemType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "file" => Ok(CloudItemType::File),
            "folder" => Ok(CloudItemType::Folder),
            "symlink" => Ok(CloudItemType::Symlink),
            "unknown" => Ok(CloudItemType::Unknown),
            _ => Err(format!("Invalid item type: {}", value)),
        }
    }
}

/// Metadata of a single item as seen by a provider.
///
/// `name` is always the last component of `cloud_path`, i.e. the name the caller
/// addressed the item by, not whatever the backend echoed back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CloudItemMetadata {
    pub name: String,
    pub cloud_path: CloudPath,
    pub item_type: CloudItemType,
    pub last_modified_date: Option<DateTime<Utc>>,
    pub size: Option<u64>,
}

impl CloudItemMetadata {
    pub fn new(
        cloud_path: CloudPath,
        item_type: CloudItemType,
        last_modified_date: Option<DateTime<Utc>>,
        size: Option<u64>,
    ) -> Self {
        Self {
            name: cloud_path.last_path_component(),
            cloud_path,
            item_type,
            last_modified_date,
            size,
        }
    }
}

/// One page of a folder listing. `next_page_token == None` marks the last page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CloudItemList {
    pub items: Vec<CloudItemMetadata>,
    pub next_page_token: Option<String>,
}

impl CloudItemList {
    pub fn new(items: Vec<CloudItemMetadata>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_name_is_last_component_of_path() {
        let metadata = CloudItemMetadata::new(
            CloudPath::new("/Documents/Reports/"),
            CloudItemType::Folder,
            None,
            None,
        );
        assert_eq!(metadata.name, "Reports");
    }

    #[test]
    fn test_item_type_serializes_lowercase() {
        let json = serde_json::to_string(&CloudItemType::Folder).unwrap();
        assert_eq!(json, "\"folder\"");

        let parsed: CloudItemType = serde_json::from_str("\"symlink\"").unwrap();
        assert_eq!(parsed, CloudItemType::Symlink);
        assert_eq!(CloudItemType::try_from("file".to_string()), Ok(CloudItemType::File));
        assert!(CloudItemType::try_from("directory".to_string()).is_err());
    }
}
