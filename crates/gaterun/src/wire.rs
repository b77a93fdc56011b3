//! A `Bus` that marshals every message through `gatepack` before it leaves.

use std::sync::Arc;

use gatepack::Message;
use tracing::trace;
use tracing::warn;

use crate::bus::Bus;
use crate::bus::PublishError;
use crate::handle::Handle;
use crate::transport::Transport;

/// Encodes outbound messages and writes the frames to a `Transport`.
#[derive(Clone)]
pub struct WireBus {
    transport: Arc<dyn Transport>,
}

impl WireBus {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl Bus for WireBus {
    async fn publish(&self, origin: Handle, message: Message) -> Result<(), PublishError> {
        let frame = gatepack::encode(&message).inspect_err(|e| {
            warn!(%origin, error = %e, "outbound message cannot be encoded");
        })?;

        self.transport.send(origin, &frame).await.inspect_err(|e| {
            warn!(%origin, error = %e, "transport refused outbound frame");
        })?;

        trace!(%origin, len = frame.len(), "published frame");
        Ok(())
    }
}
