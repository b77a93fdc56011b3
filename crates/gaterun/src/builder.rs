//! # Module Builder
//!
//! Provides a fluent API for constructing a module and wrapping it in a `ModuleHost`.

use std::sync::Arc;

use gatepack::LengthPolicy;
use tracing::debug;
use tracing::warn;

use crate::bus::Bus;
use crate::error::Result;
use crate::handle::Handle;
use crate::host::ModuleHost;
use crate::module::Module;
use crate::module::ModuleContext;
use crate::registry::Registry;

/// Fluent builder for hosted modules.
///
/// `build` fails with `Error::InvalidArgument` if the handle is null, no bus was set,
/// or the handle is already attached to the chosen registry.
pub struct ModuleBuilder {
    handle: Handle,
    bus: Option<Arc<dyn Bus>>,
    configuration: String,
    policy: LengthPolicy,
    registry: Option<Registry>,
    name: Option<String>,
}

impl ModuleBuilder {
    pub fn new(handle: impl Into<Handle>) -> Self {
        Self {
            handle: handle.into(),
            bus: None,
            configuration: String::new(),
            policy: LengthPolicy::default(),
            registry: None,
            name: None,
        }
    }

    /// Starts a builder with a fresh handle from `registry` and attaches to it.
    pub fn allocate(registry: &Registry) -> Self {
        Self::new(registry.next_handle()).registry(registry.clone())
    }

    pub fn bus(mut self, bus: Arc<dyn Bus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    /// How `ModuleHost::receive_bytes` treats the total length field. Defaults to strict.
    pub fn length_policy(mut self, policy: LengthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Name used in logs and the registry. Defaults to the module's type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build<M: Module>(self) -> Result<ModuleHost<M>> {
        let handle = self.handle;
        let context = ModuleContext::new(handle, self.bus, self.configuration)?;
        let name = self.name.unwrap_or_else(type_name::<M>);

        if let Some(registry) = &self.registry {
            registry.attach(handle, &name)?;
        }

        let module = match M::create(context) {
            Ok(module) => module,
            Err(e) => {
                warn!(%handle, module = %name, error = %e, "module construction failed");
                if let Some(registry) = &self.registry {
                    registry.detach(handle);
                }
                return Err(e);
            }
        };

        debug!(%handle, module = %name, "module created");
        Ok(ModuleHost::new(module, &name, self.policy, self.registry))
    }
}

fn type_name<M>() -> String {
    let full = std::any::type_name::<M>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}
