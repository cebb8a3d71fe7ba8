use cloud_access::{CloudItemMetadata, CloudItemType, CloudPath};

#[test]
fn test_path_components_keep_root_anchor() {
    assert_eq!(
        CloudPath::new("/foo/bar/").path_components(),
        vec!["/", "foo", "bar"]
    );
    assert_eq!(CloudPath::new("").path_components(), vec![""]);
    assert_eq!(CloudPath::new("/").path_components(), vec!["/"]);
}

#[test]
fn test_appending_does_not_collapse_separators() {
    assert_eq!(
        CloudPath::new("/foo/").appending_path_component("/bar/"),
        CloudPath::new("/foo//bar/")
    );
    assert_eq!(
        CloudPath::new("").appending_path_component("foo"),
        CloudPath::new("foo")
    );
}

#[test]
fn test_standardized_keeps_leading_parent_references() {
    assert_eq!(
        CloudPath::new("/../../foo/bar/.///../baz").standardized(),
        CloudPath::new("/../../foo/baz")
    );
}

#[test]
fn test_deleting_last_path_component_edge_cases() {
    assert_eq!(
        CloudPath::new("foo").deleting_last_path_component(),
        CloudPath::new("./")
    );
    assert_eq!(
        CloudPath::new("/").deleting_last_path_component(),
        CloudPath::new("/../")
    );
    assert_eq!(
        CloudPath::new("/foo/bar.txt").deleting_last_path_component(),
        CloudPath::new("/foo/")
    );
}

#[test]
fn test_metadata_name_follows_the_addressed_path() {
    let metadata = CloudItemMetadata::new(
        CloudPath::new("/Documents/Reports/"),
        CloudItemType::Folder,
        None,
        None,
    );
    assert_eq!(metadata.name, "Reports");

    let json = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["cloud_path"], "/Documents/Reports/");
    assert_eq!(json["item_type"], "folder");
}
