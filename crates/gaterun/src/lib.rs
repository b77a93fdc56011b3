//! # Gaterun
//!
//! The contract between a gateway host and the modules it drives.
//!
//! A host builds a module with a `Handle`, a `Bus` and an opaque configuration string,
//! feeds it `Message`s through `receive`, and retires it with a single `destroy`.
//! Modules talk back through `publish`, which the bus may marshal through `gatepack`
//! for delivery outside the process.

pub mod builder;
pub mod bus;
pub mod channel;
pub mod error;
pub mod handle;
pub mod host;
pub mod logging;
pub mod module;
pub mod registry;
pub mod transport;
pub mod wire;

pub use builder::ModuleBuilder;
pub use bus::Bus;
pub use bus::PublishError;
pub use error::Error;
pub use error::Result;
pub use handle::Handle;
pub use host::HostedModule;
pub use host::ModuleHost;
pub use module::Module;
pub use module::ModuleContext;
pub use module::State;
pub use registry::Registry;

pub use gatepack::LengthPolicy;
pub use gatepack::Message;
