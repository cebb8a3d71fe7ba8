// WebDAV adapter modules organized by functionality

pub mod config;
pub mod connection;
pub mod provider;
pub mod url_management;

// Re-export main types for convenience
pub use config::{WebDAVConfig, WebDAVCredential};
pub use connection::{PropfindDepth, WebDAVConnection};
pub use provider::WebDAVProvider;
pub use url_management::WebDAVUrlManager;
