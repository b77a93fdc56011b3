//! # Module Bus
//!
//! The shared outbound channel every module publishes through. The bus is owned by the
//! host, outlives every module attached to it, and may be called from many modules at
//! once.

use gatepack::Message;

use crate::handle::Handle;
use crate::transport::TransportError;

/// Why the bus did not accept an outbound message.
///
/// Recoverable: the publishing module decides whether to retry, drop or log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The message could not be encoded for the wire.
    Encode(gatepack::Error),
    /// The transport behind the bus refused the frame.
    Transport(TransportError),
    /// The bus refused the message for its own reasons.
    Rejected(String),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "Encode error: {}", e),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Rejected(msg) => write!(f, "Rejected by bus: {}", msg),
        }
    }
}

impl std::error::Error for PublishError {}

impl From<gatepack::Error> for PublishError {
    fn from(e: gatepack::Error) -> Self {
        Self::Encode(e)
    }
}

impl From<TransportError> for PublishError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Host-provided sink for messages leaving a module.
///
/// This trait is designed to be object-safe (`Arc<dyn Bus>`).
#[async_trait::async_trait]
pub trait Bus: Send + Sync + 'static {
    /// Hands `message` to the bus, attributed to the module identified by `origin`.
    ///
    /// Routing and fan-out are the bus's business.
    async fn publish(&self, origin: Handle, message: Message) -> Result<(), PublishError>;
}
