use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use super::registry::{inproc_address, BusInner};
use crate::error::BusError;

/// Topic-filtered broadcast channel
///
/// A Publisher owns a named binding and fans out every published frame to the
/// subscribers whose filter matches its topic. Delivery is fire-and-forget:
/// a subscriber that is not attached yet simply misses the message, and a
/// send never blocks on a slow consumer.

/// Frame carried through the channel. Both fields are opaque byte strings;
/// text decoding happens only at the receive boundary.
#[derive(Debug, Clone)]
struct Frame {
    topic: Vec<u8>,
    payload: Vec<u8>,
}

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

/// Topic filter, fixed at subscription time.
///
/// Subscribing to everything is the explicit `All` variant; an empty topic
/// set matches nothing.
#[derive(Debug, Clone)]
pub enum Subscription {
    /// Receive every message regardless of topic
    All,
    /// Receive only messages whose topic is in the set
    Topics(Vec<String>),
}

impl Subscription {
    /// Build a topic-set filter
    pub fn topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Subscription::Topics(topics.into_iter().map(Into::into).collect())
    }

    fn matches(&self, topic: &[u8]) -> bool {
        match self {
            Subscription::All => true,
            Subscription::Topics(set) => set.iter().any(|t| t.as_bytes() == topic),
        }
    }
}

struct SubscriberEntry {
    id: SubscriberId,
    filter: Subscription,
    sender: Sender<Frame>,
}

struct PubShared {
    address: String,
    subscribers: RwLock<Vec<SubscriberEntry>>,
    next_id: RwLock<usize>,
}

impl PubShared {
    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }
}

/// Owning end of a broadcast channel
pub struct Publisher {
    shared: Arc<PubShared>,
    bus: Arc<BusInner>,
}

impl Publisher {
    pub(crate) fn bind(bus: Arc<BusInner>, name: &str) -> Result<Self, BusError> {
        let address = inproc_address(name);
        bus.reserve(&address)?;

        Ok(Self {
            shared: Arc::new(PubShared {
                address,
                subscribers: RwLock::new(Vec::new()),
                next_id: RwLock::new(0),
            }),
            bus,
        })
    }

    /// The bound process-local address
    pub fn address(&self) -> &str {
        &self.shared.address
    }

    /// Publish a text message on `topic`.
    ///
    /// Both fields are encoded to bytes at this boundary and travel through
    /// the channel as a single atomic frame.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        self.publish_bytes(topic.as_bytes(), payload.as_bytes())
    }

    /// Publish a raw byte frame on `topic`
    pub fn publish_bytes(&self, topic: &[u8], payload: &[u8]) -> Result<(), BusError> {
        if self.bus.is_closed() {
            return Err(BusError::Closed);
        }

        let frame = Frame {
            topic: topic.to_vec(),
            payload: payload.to_vec(),
        };

        let subscribers = self.shared.subscribers.read();
        for subscriber in subscribers.iter() {
            if !subscriber.filter.matches(&frame.topic) {
                continue;
            }
            // If send fails, subscriber channel is closed - that's ok
            let _ = subscriber.sender.try_send(frame.clone());
        }

        Ok(())
    }

    /// Attach a new subscriber with the given filter.
    ///
    /// The subscriber only sees messages published after this call returns.
    pub fn subscribe(&self, filter: Subscription) -> Subscriber {
        let (tx, rx) = unbounded();

        let mut next_id = self.shared.next_id.write();
        let id = SubscriberId(*next_id);
        *next_id += 1;
        drop(next_id);

        self.shared.subscribers.write().push(SubscriberEntry {
            id,
            filter,
            sender: tx,
        });

        Subscriber {
            id,
            receiver: rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Get number of attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.read().len()
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        // Detach subscribers so their receives report Disconnected, then free
        // the address for rebinding
        self.shared.subscribers.write().clear();
        self.bus.release(&self.shared.address);
    }
}

/// Receiving end of a broadcast channel, valid while its Publisher is alive
pub struct Subscriber {
    id: SubscriberId,
    receiver: Receiver<Frame>,
    shared: Arc<PubShared>,
}

impl Subscriber {
    /// Block until a matching message arrives and decode it to
    /// (topic, payload) text
    pub fn recv(&self) -> Result<(String, String), BusError> {
        let frame = self.receiver.recv().map_err(|_| BusError::Disconnected)?;
        decode(frame)
    }

    /// Bounded-wait receive: returns `Ok(None)` when `timeout` elapses with
    /// no matching message, so a caller can re-check its stop flag
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<(String, String)>, BusError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(frame) => decode(frame).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(BusError::Disconnected),
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.shared.unsubscribe(self.id);
    }
}

fn decode(frame: Frame) -> Result<(String, String), BusError> {
    let topic = String::from_utf8(frame.topic).map_err(BusError::InvalidUtf8)?;
    let payload = String::from_utf8(frame.payload).map_err(BusError::InvalidUtf8)?;
    Ok((topic, payload))
}
