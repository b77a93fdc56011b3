//! In-process transport over a tokio channel.
//!
//! Useful for wiring a host to modules living in the same process, and for tests that
//! want to inspect exactly what went over the wire.

use tokio::sync::mpsc;

use crate::handle::Handle;
use crate::transport;
use crate::transport::Transport;
use crate::transport::TransportError;

/// A frame as it left a `ChannelTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub origin: Handle,
    pub frame: Vec<u8>,
}

/// A transport that pushes frames into an unbounded mpsc channel.
///
/// Once the receiving half is dropped every send fails with `ConnectionLost`.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Delivery>,
    max_frame: Option<usize>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver its frames arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, max_frame: None }, rx)
    }

    /// Rejects frames longer than `max` bytes with `PayloadTooLarge`.
    pub fn with_max_frame(mut self, max: usize) -> Self {
        self.max_frame = Some(max);
        self
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, origin: Handle, frame: &[u8]) -> transport::Result<()> {
        if let Some(max) = self.max_frame {
            if frame.len() > max {
                return Err(TransportError::PayloadTooLarge(frame.len()));
            }
        }

        self.tx
            .send(Delivery { origin, frame: frame.to_vec() })
            .map_err(|_| TransportError::ConnectionLost("Channel closed".into()))
    }
}
