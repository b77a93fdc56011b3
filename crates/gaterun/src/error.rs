//! # Error Definitions
//!
//! Failures the module contract reports back to the host.

use crate::handle::Handle;

/// Host-facing failures of the module contract.
///
/// Publish failures are not listed here; modules see them as `PublishError` and decide
/// for themselves what to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Construction was attempted with a null handle, no bus, or a taken handle.
    InvalidArgument(String),
    /// The concrete module refused its configuration.
    Setup(String),
    /// Inbound bytes could not be decoded into a `Message`.
    Codec(gatepack::Error),
    /// A call arrived after the module was destroyed.
    Destroyed(Handle),
    /// `destroy` was called a second time.
    AlreadyDestroyed(Handle),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::Setup(msg) => write!(f, "Module setup failed: {}", msg),
            Self::Codec(e) => write!(f, "Codec error: {}", e),
            Self::Destroyed(handle) => write!(f, "Module {} is destroyed", handle),
            Self::AlreadyDestroyed(handle) => write!(f, "Module {} was already destroyed", handle),
        }
    }
}

impl std::error::Error for Error {}

impl From<gatepack::Error> for Error {
    fn from(e: gatepack::Error) -> Self {
        Self::Codec(e)
    }
}

/// A specialized Result type for module contract operations.
pub type Result<T> = std::result::Result<T, Error>;
