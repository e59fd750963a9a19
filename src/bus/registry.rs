/// Bus registry for channel-name bindings
///
/// One registry owns the process-local address space. Publishers and pushers
/// reserve an address at bind time and release it when dropped; closing the
/// registry invalidates every channel bound through it.
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::pubsub::Publisher;
use super::pushpull::Pusher;
use crate::error::BusError;

/// Build the process-local address for a channel name
pub(crate) fn inproc_address(name: &str) -> String {
    format!("inproc://{name}")
}

/// Shared registry state, held by the registry handle and by every endpoint
/// bound through it
pub(crate) struct BusInner {
    bound: Mutex<HashSet<String>>,
    closed: AtomicBool,
}

impl BusInner {
    pub(crate) fn reserve(&self, address: &str) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let mut bound = self.bound.lock();
        if !bound.insert(address.to_string()) {
            return Err(BusError::AddressInUse(address.to_string()));
        }
        Ok(())
    }

    pub(crate) fn release(&self, address: &str) {
        self.bound.lock().remove(address);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Registry of in-process channel bindings
///
/// Cheaply cloneable handle over shared state; constructors needing the bus
/// receive a handle explicitly instead of reaching for a process global.
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    /// Create a new registry with an empty address space
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                bound: Mutex::new(HashSet::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Bind a broadcast publisher under `name`, reserving its address
    pub fn bind_publisher(&self, name: &str) -> Result<Publisher, BusError> {
        Publisher::bind(Arc::clone(&self.inner), name)
    }

    /// Bind a command-queue pusher under `name`, reserving its address
    pub fn bind_pusher<T: Serialize>(&self, name: &str) -> Result<Pusher<T>, BusError> {
        Pusher::bind(Arc::clone(&self.inner), name)
    }

    /// Close the registry: every endpoint bound through it stops accepting
    /// sends with [`BusError::Closed`]
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// Check whether the registry has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Number of currently bound addresses
    pub fn bound_count(&self) -> usize {
        self.inner.bound.lock().len()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Bus {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
