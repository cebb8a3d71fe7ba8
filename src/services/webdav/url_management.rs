use url::Url;

use crate::cloud_path::CloudPath;
use crate::errors::WebDavError;

/// Maps cloud paths onto request URLs below the configured DAV root.
///
/// Every path is treated as relative to the root, whether or not it has a leading
/// separator. Each segment is percent-encoded on its own so the separators survive.
#[derive(Debug, Clone)]
pub struct WebDAVUrlManager {
    base_url: Url,
}

impl WebDAVUrlManager {
    pub fn new(base_url: &str) -> Result<Self, WebDavError> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|_| WebDavError::ResolvingUrlFailed {
            path: base_url.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(WebDavError::ResolvingUrlFailed {
                path: base_url.to_string(),
            });
        }
        Ok(Self { base_url })
    }

    /// Always ends with a separator.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resolve(&self, cloud_path: &CloudPath) -> Result<Url, WebDavError> {
        // Paths climbing above the root would resolve outside the DAV namespace.
        let escapes_root = cloud_path
            .standardized()
            .path_components()
            .iter()
            .any(|component| component == "..");
        if escapes_root {
            return Err(self.resolution_failure(cloud_path));
        }

        let relative = cloud_path.as_str().trim_start_matches('/');
        let encoded = relative
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        self.base_url
            .join(&encoded)
            .map_err(|_| self.resolution_failure(cloud_path))
    }

    /// Like [`resolve`](Self::resolve) but always yields a collection URL.
    pub fn resolve_folder(&self, cloud_path: &CloudPath) -> Result<Url, WebDavError> {
        let mut url = self.resolve(cloud_path)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    fn resolution_failure(&self, cloud_path: &CloudPath) -> WebDavError {
        WebDavError::ResolvingUrlFailed {
            path: cloud_path.to_string(),
        }
    }
}
