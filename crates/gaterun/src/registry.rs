//! # Module Registry
//!
//! Bookkeeping for the modules a host currently has alive.
//!
//! Uses DashMap so modules on different tasks can attach and detach without a global
//! lock. A registry hands out fresh handles, refuses to attach the same handle twice,
//! and forgets a module once it is destroyed.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;

/// Shared registry of live modules. Clones refer to the same registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

struct Inner {
    modules: DashMap<Handle, String>,
    next_handle: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                modules: DashMap::new(),
                next_handle: AtomicU64::new(1),
            }),
        }
    }

    /// Returns a non-null handle no live module is using.
    pub fn next_handle(&self) -> Handle {
        loop {
            let handle = Handle(self.inner.next_handle.fetch_add(1, Ordering::Relaxed));
            if !handle.is_null() && !self.inner.modules.contains_key(&handle) {
                return handle;
            }
        }
    }

    pub(crate) fn attach(&self, handle: Handle, name: &str) -> Result<()> {
        let inserted = match self.inner.modules.entry(handle) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(name.to_string());
                true
            }
        };
        // The entry guard is gone by now; len() takes every shard lock.
        if !inserted {
            return Err(Error::InvalidArgument(format!("{} is already attached", handle)));
        }
        debug!(%handle, module = name, live = self.len(), "module attached");
        Ok(())
    }

    pub(crate) fn detach(&self, handle: Handle) -> bool {
        let removed = self.inner.modules.remove(&handle).is_some();
        if removed {
            debug!(%handle, live = self.inner.modules.len(), "module detached");
        }
        removed
    }

    /// Number of live modules.
    pub fn len(&self) -> usize {
        self.inner.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.modules.is_empty()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.inner.modules.contains_key(&handle)
    }

    /// The name a live module was attached under.
    pub fn name(&self, handle: Handle) -> Option<String> {
        self.inner.modules.get(&handle).map(|entry| entry.value().clone())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
