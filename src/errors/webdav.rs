use thiserror::Error;

/// Adapter-internal WebDAV failures. None of these are canonical; they surface to
/// callers wrapped in `ProviderError::Backend`.
#[derive(Error, Debug)]
pub enum WebDavError {
    #[error("Resolving URL for path '{path}' failed")]
    ResolvingUrlFailed { path: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected HTTP status {status}")]
    Http { status: u16 },

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Raw outcome of a failed request, before any per-operation classification.
#[derive(Error, Debug)]
pub enum WebDavTransportError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Server unreachable: {0}")]
    Connectivity(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Other(#[source] reqwest::Error),
}

impl WebDavTransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            WebDavTransportError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WebDavTransportError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            WebDavTransportError::Status(status.as_u16())
        } else if error.is_connect() {
            WebDavTransportError::Connectivity(error)
        } else {
            WebDavTransportError::Other(error)
        }
    }
}

impl From<WebDavTransportError> for WebDavError {
    fn from(error: WebDavTransportError) -> Self {
        match error {
            WebDavTransportError::Status(status) => WebDavError::Http { status },
            WebDavTransportError::Connectivity(e) | WebDavTransportError::Other(e) => {
                WebDavError::Transport(e)
            }
        }
    }
}
