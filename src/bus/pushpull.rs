use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::registry::{inproc_address, BusInner};
use crate::error::BusError;

/// Single-consumer command queue
///
/// A Pusher owns a named binding and serializes each command object as
/// structured text before enqueueing it. Exactly one Puller drains the queue;
/// commands are point-to-point work items, not broadcasts, so multi-consumer
/// fan-out is unsupported by contract. Pushers are cheap to clone for
/// concurrent producers; ordering is FIFO per sender.

struct PushShared {
    address: String,
    sender: Sender<String>,
    receiver: Mutex<Option<Receiver<String>>>,
    bus: Arc<BusInner>,
}

impl Drop for PushShared {
    fn drop(&mut self) {
        self.bus.release(&self.address);
    }
}

/// Producing end of a command queue
pub struct Pusher<T> {
    shared: Arc<PushShared>,
    _marker: PhantomData<fn(T)>,
}

impl<T: Serialize> Pusher<T> {
    pub(crate) fn bind(bus: Arc<BusInner>, name: &str) -> Result<Self, BusError> {
        let address = inproc_address(name);
        bus.reserve(&address)?;

        let (tx, rx) = unbounded();
        Ok(Self {
            shared: Arc::new(PushShared {
                address,
                sender: tx,
                receiver: Mutex::new(Some(rx)),
                bus,
            }),
            _marker: PhantomData,
        })
    }

    /// The bound process-local address
    pub fn address(&self) -> &str {
        &self.shared.address
    }

    /// Serialize `command` as structured text and enqueue it
    pub fn push(&self, command: &T) -> Result<(), BusError> {
        let text = serde_json::to_string(command).map_err(BusError::EncodeFailed)?;
        self.push_raw(text)
    }

    pub(crate) fn push_raw(&self, text: String) -> Result<(), BusError> {
        if self.shared.bus.is_closed() {
            return Err(BusError::Closed);
        }
        self.shared
            .sender
            .send(text)
            .map_err(|_| BusError::Disconnected)
    }

    /// Attach the queue's single consumer.
    ///
    /// Fails with [`BusError::ConsumerAttached`] once a Puller exists; the
    /// queue never fans out.
    pub fn attach(&self) -> Result<Puller<T>, BusError>
    where
        T: DeserializeOwned,
    {
        let receiver = self
            .shared
            .receiver
            .lock()
            .take()
            .ok_or_else(|| BusError::ConsumerAttached(self.shared.address.clone()))?;

        Ok(Puller {
            receiver,
            _marker: PhantomData,
        })
    }
}

impl<T> Clone for Pusher<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _marker: PhantomData,
        }
    }
}

/// Consuming end of a command queue, valid while any Pusher clone is alive
pub struct Puller<T> {
    receiver: Receiver<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Puller<T> {
    /// Block until one item is available and deserialize it.
    ///
    /// A decode failure consumes only the bad message; the next receive sees
    /// the following item.
    pub fn recv(&self) -> Result<T, BusError> {
        let text = self.receiver.recv().map_err(|_| BusError::Disconnected)?;
        serde_json::from_str(&text).map_err(BusError::DecodeFailed)
    }

    /// Bounded-wait receive: returns `Ok(None)` when `timeout` elapses with
    /// no item, so a caller can re-check its stop flag
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, BusError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(BusError::DecodeFailed),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(BusError::Disconnected),
        }
    }
}
