use thiserror::Error;

pub mod webdav;

pub use webdav::{WebDavError, WebDavTransportError};

/// Canonical, backend-independent failure kinds.
///
/// These are terminal classifications: upper layers branch on them and never
/// re-interpret or re-wrap them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudProviderError {
    #[error("Item not found")]
    ItemNotFound,

    #[error("Item already exists")]
    ItemAlreadyExists,

    #[error("Item type mismatch")]
    ItemTypeMismatch,

    #[error("Parent folder does not exist")]
    ParentFolderDoesNotExist,

    #[error("Page token invalid")]
    PageTokenInvalid,

    #[error("Quota insufficient")]
    QuotaInsufficient,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("No internet connection")]
    NoInternetConnection,
}

/// Failure returned by every [`CloudProvider`](crate::CloudProvider) operation.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Canonical classification, the only kind callers may branch on.
    #[error(transparent)]
    Cloud(#[from] CloudProviderError),

    /// The caller broke an operation precondition (e.g. listing a file-shaped path).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Opaque adapter-internal failure. Treat as a generic error.
    #[error(transparent)]
    Backend(anyhow::Error),
}

impl ProviderError {
    pub fn as_cloud(&self) -> Option<CloudProviderError> {
        match self {
            ProviderError::Cloud(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is(&self, kind: CloudProviderError) -> bool {
        self.as_cloud() == Some(kind)
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ProviderError::InvalidArgument(message.into())
    }
}

impl From<WebDavError> for ProviderError {
    fn from(error: WebDavError) -> Self {
        ProviderError::Backend(anyhow::Error::new(error))
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(error: std::io::Error) -> Self {
        ProviderError::Backend(anyhow::Error::new(error))
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
