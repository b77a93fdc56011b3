//! # Module Host
//!
//! Thread-safe handle to a running module. Encapsulates the module and its lifecycle
//! state in a mutex so any number of tasks can drive it while the module itself only
//! ever sees one call at a time.

use std::sync::Arc;

use gatepack::LengthPolicy;
use gatepack::Message;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;
use crate::module::Module;
use crate::module::State;
use crate::registry::Registry;

/// Drives one module through its lifecycle.
///
/// Clones share the same module. Built with `ModuleBuilder`.
pub struct ModuleHost<M: Module> {
    handle: Handle,
    name: Arc<str>,
    policy: LengthPolicy,
    registry: Option<Registry>,
    inner: Arc<Mutex<Slot<M>>>,
}

struct Slot<M> {
    module: M,
    state: State,
}

impl<M: Module> Clone for ModuleHost<M> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            name: self.name.clone(),
            policy: self.policy,
            registry: self.registry.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<M: Module> ModuleHost<M> {
    pub(crate) fn new(module: M, name: &str, policy: LengthPolicy, registry: Option<Registry>) -> Self {
        Self {
            handle: module.context().handle(),
            name: Arc::from(name),
            policy,
            registry,
            inner: Arc::new(Mutex::new(Slot { module, state: State::Created })),
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> State {
        self.inner.lock().await.state
    }

    /// Delivers one message to the module.
    ///
    /// Calls are serialized: a second `receive` waits until the first returns.
    ///
    /// # Errors
    /// `Error::Destroyed` if the module has already been destroyed. The module is not
    /// called.
    pub async fn receive(&self, message: Message) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let slot = &mut *guard;

        match slot.state {
            State::Destroyed => {
                warn!(handle = %self.handle, module = %self.name, "receive after destroy rejected");
                return Err(Error::Destroyed(self.handle));
            }
            State::Created => {
                debug!(handle = %self.handle, module = %self.name, "first message, module active");
                slot.state = State::Active;
            }
            State::Active => {}
        }

        slot.module.receive(message).await;
        Ok(())
    }

    /// Decodes an inbound frame and delivers it.
    ///
    /// # Errors
    /// `Error::Codec` if the frame does not decode under this host's `LengthPolicy`; the
    /// module never sees it. Otherwise as `receive`.
    pub async fn receive_bytes(&self, bytes: &[u8]) -> Result<()> {
        let message = gatepack::decode_with(bytes, self.policy).inspect_err(|e| {
            warn!(handle = %self.handle, module = %self.name, error = %e, "dropping undecodable inbound frame");
        })?;
        self.receive(message).await
    }

    /// Retires the module.
    ///
    /// Waits for an in-flight `receive` to finish, runs the module's `destroy`, and
    /// detaches the module from its registry.
    ///
    /// # Errors
    /// `Error::AlreadyDestroyed` on every call after the first. The module's `destroy`
    /// is not run again.
    pub async fn destroy(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let slot = &mut *guard;

        if slot.state == State::Destroyed {
            warn!(handle = %self.handle, module = %self.name, "destroy called twice");
            return Err(Error::AlreadyDestroyed(self.handle));
        }

        slot.module.destroy().await;
        slot.state = State::Destroyed;

        if let Some(registry) = &self.registry {
            registry.detach(self.handle);
        }
        debug!(handle = %self.handle, module = %self.name, "module destroyed");
        Ok(())
    }

    /// Runs a closure against the module while holding the lock.
    ///
    /// Meant for inspection; the closure must not block.
    pub async fn exec<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&M) -> R,
    {
        let guard = self.inner.lock().await;
        f(&guard.module)
    }
}

/// Object-safe view of a `ModuleHost`, so a host can keep modules of different types
/// side by side (`Arc<dyn HostedModule>`).
#[async_trait::async_trait]
pub trait HostedModule: Send + Sync {
    fn handle(&self) -> Handle;
    fn name(&self) -> &str;
    async fn state(&self) -> State;
    async fn receive(&self, message: Message) -> Result<()>;
    async fn receive_bytes(&self, bytes: &[u8]) -> Result<()>;
    async fn destroy(&self) -> Result<()>;
}

#[async_trait::async_trait]
impl<M: Module> HostedModule for ModuleHost<M> {
    fn handle(&self) -> Handle {
        ModuleHost::handle(self)
    }

    fn name(&self) -> &str {
        ModuleHost::name(self)
    }

    async fn state(&self) -> State {
        ModuleHost::state(self).await
    }

    async fn receive(&self, message: Message) -> Result<()> {
        ModuleHost::receive(self, message).await
    }

    async fn receive_bytes(&self, bytes: &[u8]) -> Result<()> {
        ModuleHost::receive_bytes(self, bytes).await
    }

    async fn destroy(&self) -> Result<()> {
        ModuleHost::destroy(self).await
    }
}
