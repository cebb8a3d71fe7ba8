use serde::{Deserialize, Serialize};
use std::fmt;

const SEPARATOR: char = '/';
const ANCHOR: &str = "/";

/// Slash-separated location inside one backend's namespace.
///
/// A `CloudPath` is compared and hashed by its exact textual form. Nothing is
/// normalized implicitly: `/foo` and `/foo/` are different paths, and the trailing
/// separator is how callers tell the providers that they mean a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloudPath {
    path: String,
}

impl CloudPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Folder-shaped paths end with a separator.
    pub fn has_directory_path(&self) -> bool {
        self.path.ends_with(SEPARATOR)
    }

    /// `/` and runs of separators like `//` all denote the root.
    pub fn is_root(&self) -> bool {
        !self.path.is_empty() && self.path.chars().all(|c| c == SEPARATOR)
    }

    /// Splits on `/`, dropping empty segments but keeping `.` and `..` verbatim.
    ///
    /// Absolute paths start with the anchor component `"/"`. The empty path yields
    /// a single empty component.
    ///
    /// ```
    /// use cloud_access::CloudPath;
    ///
    /// assert_eq!(CloudPath::new("///foo//bar/").path_components(), vec!["/", "foo", "bar"]);
    /// assert_eq!(CloudPath::new("").path_components(), vec![""]);
    /// ```
    pub fn path_components(&self) -> Vec<String> {
        if self.path.is_empty() {
            return vec![String::new()];
        }
        let mut components = Vec::new();
        if self.path.starts_with(SEPARATOR) {
            components.push(ANCHOR.to_string());
        }
        components.extend(
            self.path
                .split(SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
        components
    }

    pub fn last_path_component(&self) -> String {
        self.path_components().pop().unwrap_or_default()
    }

    /// Literal concatenation with at most one inserted separator.
    ///
    /// Doubled separators coming from either side are preserved.
    pub fn appending_path_component(&self, component: &str) -> CloudPath {
        if self.path.is_empty() {
            return CloudPath::new(component);
        }
        if self.path.ends_with(SEPARATOR) || component.starts_with(SEPARATOR) {
            CloudPath::new(format!("{}{}", self.path, component))
        } else {
            CloudPath::new(format!("{}{}{}", self.path, SEPARATOR, component))
        }
    }

    /// Removes the final component. The result always ends with a separator.
    ///
    /// Paths without a real parent get a syntactic "one level up" instead:
    /// `foo` becomes `./`, `/` becomes `/../` and `..` becomes `../../`.
    pub fn deleting_last_path_component(&self) -> CloudPath {
        if self.path.is_empty() {
            return CloudPath::new("../");
        }
        let trimmed = trimming_trailing_characters(&self.path, &[SEPARATOR]);
        if trimmed.is_empty() {
            return CloudPath::new("/../");
        }
        let (head, last) = match trimmed.rfind(SEPARATOR) {
            Some(index) => (&trimmed[..=index], &trimmed[index + 1..]),
            None => ("", trimmed),
        };
        match last {
            ".." => CloudPath::new(format!("{}/../", trimmed)),
            "." => CloudPath::new(format!("{}../", head)),
            _ if head.is_empty() => CloudPath::new("./"),
            _ => CloudPath::new(head),
        }
    }

    /// Lexically resolves `.` and `..`.
    ///
    /// A `..` that has nothing real to pop (start of a relative path, right after the
    /// anchor, or after another kept `..`) stays in place.
    pub fn standardized(&self) -> CloudPath {
        if self.path.is_empty() {
            return self.clone();
        }
        let mut stack: Vec<String> = Vec::new();
        for component in self.path_components() {
            match component.as_str() {
                "." => {}
                ".." => match stack.last().map(String::as_str) {
                    None | Some(ANCHOR) | Some("..") => stack.push(component),
                    Some(_) => {
                        stack.pop();
                    }
                },
                _ => stack.push(component),
            }
        }

        let absolute = stack.first().map(String::as_str) == Some(ANCHOR);
        let rest: Vec<&str> = stack
            .iter()
            .skip(usize::from(absolute))
            .map(String::as_str)
            .collect();
        let mut standardized = if absolute {
            format!("{}{}", ANCHOR, rest.join(ANCHOR))
        } else if rest.is_empty() {
            ".".to_string()
        } else {
            rest.join(ANCHOR)
        };
        if self.has_directory_path() && !standardized.ends_with(SEPARATOR) {
            standardized.push(SEPARATOR);
        }
        CloudPath::new(standardized)
    }
}

impl fmt::Display for CloudPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for CloudPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl From<&str> for CloudPath {
    fn from(path: &str) -> Self {
        CloudPath::new(path)
    }
}

impl From<String> for CloudPath {
    fn from(path: String) -> Self {
        CloudPath::new(path)
    }
}

pub fn trimming_leading_characters<'a>(s: &'a str, set: &[char]) -> &'a str {
    s.trim_start_matches(|c: char| set.contains(&c))
}

pub fn trimming_trailing_characters<'a>(s: &'a str, set: &[char]) -> &'a str {
    s.trim_end_matches(|c: char| set.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(path: &str) -> Vec<String> {
        CloudPath::new(path).path_components()
    }

    fn deleting(path: &str) -> String {
        CloudPath::new(path).deleting_last_path_component().as_str().to_string()
    }

    fn appending(path: &str, component: &str) -> String {
        CloudPath::new(path)
            .appending_path_component(component)
            .as_str()
            .to_string()
    }

    #[test]
    fn test_trimming_leading_characters() {
        assert_eq!("foo", trimming_leading_characters("///foo", &['/']));
        assert_eq!("foo///bar", trimming_leading_characters("/foo///bar", &['/']));
        assert_eq!("foo///bar", trimming_leading_characters("foo///bar", &['/']));
    }

    #[test]
    fn test_trimming_trailing_characters() {
        assert_eq!("foo", trimming_trailing_characters("foo///", &['/']));
        assert_eq!("foo///bar", trimming_trailing_characters("foo///bar/", &['/']));
        assert_eq!("foo///bar", trimming_trailing_characters("foo///bar", &['/']));
    }

    #[test]
    fn test_path_components() {
        assert_eq!(vec!["/", "foo", "bar"], components("/foo/bar/"));
        assert_eq!(vec!["/", "foo", "bar"], components("/foo/bar"));
        assert_eq!(vec!["/", "foo"], components("/foo/"));
        assert_eq!(vec!["foo"], components("foo/"));
        assert_eq!(vec!["foo"], components("foo"));

        assert_eq!(vec!["/", "foo"], components("///foo///"));
        assert_eq!(vec!["foo"], components("foo///"));
        assert_eq!(vec!["/", "foo"], components("///foo"));
        assert_eq!(vec!["foo", "bar"], components("foo///bar"));

        assert_eq!(vec!["/", ".."], components("/../"));
        assert_eq!(vec![".."], components(".."));
        assert_eq!(vec!["/", "."], components("/."));
        assert_eq!(vec!["."], components("./"));

        assert_eq!(vec!["/"], components("/"));
        assert_eq!(vec![""], components(""));
    }

    #[test]
    fn test_last_path_component() {
        assert_eq!("bar", CloudPath::new("/foo/bar/").last_path_component());
        assert_eq!("foo", CloudPath::new("foo").last_path_component());
        assert_eq!("foo", CloudPath::new("///foo///").last_path_component());
        assert_eq!("bar", CloudPath::new("foo///bar").last_path_component());
        assert_eq!("..", CloudPath::new("/../").last_path_component());
        assert_eq!(".", CloudPath::new("./").last_path_component());
        assert_eq!("/", CloudPath::new("/").last_path_component());
        assert_eq!("", CloudPath::new("").last_path_component());
    }

    #[test]
    fn test_appending_path_component() {
        assert_eq!("/foo//bar/", appending("/foo/", "/bar/"));
        assert_eq!("/foo//bar", appending("/foo/", "/bar"));
        assert_eq!("/foo/bar/", appending("/foo/", "bar/"));
        assert_eq!("/foo/bar", appending("/foo/", "bar"));

        assert_eq!("/foo/bar/", appending("/foo", "/bar/"));
        assert_eq!("/foo/bar", appending("/foo", "/bar"));
        assert_eq!("/foo/bar/", appending("/foo", "bar/"));
        assert_eq!("/foo/bar", appending("/foo", "bar"));

        assert_eq!("foo//bar/", appending("foo/", "/bar/"));
        assert_eq!("foo/bar", appending("foo", "bar"));

        assert_eq!("///foo//////bar///", appending("///foo///", "///bar///"));
        assert_eq!("/foo", appending("/", "foo"));
        assert_eq!("foo", appending("", "foo"));
    }

    #[test]
    fn test_deleting_last_path_component() {
        assert_eq!("/foo/", deleting("/foo/bar/"));
        assert_eq!("/foo/", deleting("/foo/bar"));
        assert_eq!("/", deleting("/foo/"));
        assert_eq!("/", deleting("/foo"));
        assert_eq!("./", deleting("foo/"));
        assert_eq!("./", deleting("foo"));

        assert_eq!("///", deleting("///foo///"));
        assert_eq!("./", deleting("foo///"));
        assert_eq!("///", deleting("///foo"));
        assert_eq!("foo///", deleting("foo///bar"));

        assert_eq!("/../../", deleting("/../"));
        assert_eq!("/../../", deleting("/.."));
        assert_eq!("../../", deleting("../"));
        assert_eq!("../../", deleting(".."));
        assert_eq!("/../", deleting("/./"));
        assert_eq!("/../", deleting("/."));
        assert_eq!("../", deleting("./"));
        assert_eq!("../", deleting("."));

        assert_eq!("/../", deleting("/"));
        assert_eq!("../", deleting(""));
    }

    #[test]
    fn test_standardized() {
        assert_eq!(
            "/../../foo/baz",
            CloudPath::new("/../../foo/bar/.///../baz").standardized().as_str()
        );
        assert_eq!("/foo/", CloudPath::new("/foo/bar/../").standardized().as_str());
        assert_eq!("../bar", CloudPath::new("../foo/../bar").standardized().as_str());
        assert_eq!(".", CloudPath::new("foo/..").standardized().as_str());
        assert_eq!("/", CloudPath::new("/foo/..").standardized().as_str());
    }

    #[test]
    fn test_is_root() {
        assert!(CloudPath::new("/").is_root());
        assert!(CloudPath::new("//").is_root());
        assert!(!CloudPath::new("").is_root());
        assert!(!CloudPath::new("/foo").is_root());
        assert!(!CloudPath::new("/..").is_root());
    }

    #[test]
    fn test_equality_is_textual() {
        assert_ne!(CloudPath::new("/foo"), CloudPath::new("/foo/"));
        assert_ne!(CloudPath::new("/foo/bar"), CloudPath::new("/foo//bar"));
        assert_eq!(CloudPath::new("/foo"), CloudPath::from("/foo"));
    }
}
