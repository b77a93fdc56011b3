//! # Transport Abstraction
//!
//! A minimal, async sink for encoded frames leaving the process.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: The Transport knows nothing about `Message`, properties or the
//!   wire layout. It moves opaque frames.
//! - **Attributed**: Every frame carries the `Handle` of the module that produced it, so
//!   the far side can tell sources apart without looking inside the frame.
//! - **One-Way**: Outbound publish is fire-and-forget. Replies, if any, come back as
//!   ordinary inbound messages routed by the host.

use std::fmt;

use crate::handle::Handle;

/// Errors that occur at the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The far side is gone or the channel was closed.
    ConnectionLost(String),
    /// The far side rejected the frame size.
    PayloadTooLarge(usize),
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::PayloadTooLarge(len) => write!(f, "Frame of {} bytes too large for transport", len),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A mechanism to move an encoded frame out of the process.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one frame on behalf of `origin`.
    ///
    /// # Invariants
    /// - Must return `Ok(())` once the frame has been accepted for delivery.
    /// - Must return `Err` if the frame cannot be accepted.
    /// - Must not interpret the frame content.
    async fn send(&self, origin: Handle, frame: &[u8]) -> Result<()>;
}
