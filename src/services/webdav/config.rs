use anyhow::{anyhow, Result};
use std::env;
use std::fmt;

/// WebDAV server configuration
#[derive(Clone)]
pub struct WebDAVConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
    pub server_type: Option<String>, // "nextcloud", "owncloud", "generic"
}

/// Credential attached to every request of one provider instance.
#[derive(Clone, PartialEq, Eq)]
pub enum WebDAVCredential {
    Anonymous,
    Basic { username: String, password: String },
    Bearer(String),
}

impl fmt::Debug for WebDAVCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebDAVCredential::Anonymous => write!(f, "Anonymous"),
            WebDAVCredential::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            WebDAVCredential::Bearer(_) => write!(f, "Bearer(<redacted>)"),
        }
    }
}

impl fmt::Debug for WebDAVConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDAVConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("server_type", &self.server_type)
            .finish()
    }
}

impl WebDAVConfig {
    /// Creates a new WebDAV configuration
    pub fn new(server_url: String, username: String, password: String) -> Self {
        Self {
            server_url,
            username,
            password,
            timeout_seconds: 30,
            server_type: None,
        }
    }

    /// Reads `WEBDAV_*` variables, loading a `.env` file first if there is one.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = WebDAVConfig {
            server_url: env::var("WEBDAV_SERVER_URL")
                .map_err(|_| anyhow!("WEBDAV_SERVER_URL must be set"))?,
            username: env::var("WEBDAV_USERNAME").unwrap_or_default(),
            password: env::var("WEBDAV_PASSWORD").unwrap_or_default(),
            timeout_seconds: env::var("WEBDAV_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            server_type: env::var("WEBDAV_SERVER_TYPE")
                .ok()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(anyhow!("Server URL cannot be empty"));
        }

        if self.username.is_empty() && !self.password.is_empty() {
            return Err(anyhow!("Password given without a username"));
        }

        if self.timeout_seconds == 0 {
            return Err(anyhow!("Timeout must be at least one second"));
        }

        // Validate URL format
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(anyhow!("Server URL must start with http:// or https://"));
        }

        Ok(())
    }

    /// Returns the base URL for WebDAV operations
    pub fn webdav_url(&self) -> String {
        let mut url = self.server_url.trim_end_matches('/').to_string();

        // Add WebDAV path based on server type
        match self.server_type.as_deref() {
            Some("nextcloud") => {
                if !url.contains("/remote.php/dav/files/") {
                    url.push_str(&format!("/remote.php/dav/files/{}", self.username));
                }
            }
            Some("owncloud") => {
                if !url.contains("/remote.php/webdav") {
                    url.push_str("/remote.php/webdav");
                }
            }
            _ => {
                // Generic WebDAV - use the URL as provided
            }
        }

        url
    }

    pub fn credential(&self) -> WebDAVCredential {
        if self.username.is_empty() {
            WebDAVCredential::Anonymous
        } else {
            WebDAVCredential::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            }
        }
    }

    /// Gets the timeout duration
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}
