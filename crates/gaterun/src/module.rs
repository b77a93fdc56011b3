//! # Module Contract
//!
//! What every module implements so a host can drive it without knowing what it does.
//!
//! ## Lifecycle
//!
//! ```text
//! Created --first receive--> Active --destroy--> Destroyed
//! ```
//!
//! `Created` and `Active` behave the same in the contract; the split only records
//! whether a message has arrived yet. `Destroyed` is terminal.

use std::sync::Arc;

use gatepack::Message;

use crate::bus::Bus;
use crate::bus::PublishError;
use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;

/// Lifecycle state of a hosted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Active,
    Destroyed,
}

/// The values a host hands a module at construction.
///
/// Cheap to clone. Holding a context does not keep the module alive; the bus it
/// points at is owned by the host.
#[derive(Clone)]
pub struct ModuleContext {
    handle: Handle,
    bus: Arc<dyn Bus>,
    configuration: Arc<str>,
}

impl ModuleContext {
    /// Validates the construction arguments.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `handle` is null or `bus` is `None`. The
    /// configuration is never inspected; an empty string is fine.
    pub fn new(handle: Handle, bus: Option<Arc<dyn Bus>>, configuration: impl Into<String>) -> Result<Self> {
        if handle.is_null() {
            return Err(Error::InvalidArgument("handle must be non-zero".into()));
        }
        let Some(bus) = bus else {
            return Err(Error::InvalidArgument(format!("{} has no bus", handle)));
        };

        let configuration: String = configuration.into();
        Ok(Self {
            handle,
            bus,
            configuration: Arc::from(configuration),
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn bus(&self) -> &Arc<dyn Bus> {
        &self.bus
    }

    /// The module-specific configuration, exactly as the host passed it.
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// Forwards `message` to the bus, tagged with this module's handle.
    pub async fn publish(&self, message: Message) -> std::result::Result<(), PublishError> {
        self.bus.publish(self.handle, message).await
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("handle", &self.handle)
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

/// A processing unit the host can build, feed and retire.
///
/// The host wrapper (`ModuleHost`) guarantees that `receive` calls never overlap, that
/// `destroy` runs at most once, and that nothing is delivered after `destroy`.
#[async_trait::async_trait]
pub trait Module: Send + Sync + 'static {
    /// Module-specific construction from a validated context.
    ///
    /// This is where a module parses its configuration. Return `Error::Setup` to refuse.
    fn create(context: ModuleContext) -> Result<Self>
    where
        Self: Sized;

    /// The context the module was created with.
    fn context(&self) -> &ModuleContext;

    /// Handles one routed message.
    ///
    /// Failures while acting on the message are the module's to log or publish; they are
    /// never returned to the host.
    async fn receive(&mut self, message: Message);

    /// Releases everything the module acquired. Must cope with nothing ever having been
    /// acquired.
    async fn destroy(&mut self);

    /// Hands an outbound message to the bus.
    async fn publish(&self, message: Message) -> std::result::Result<(), PublishError> {
        self.context().publish(message).await
    }
}
