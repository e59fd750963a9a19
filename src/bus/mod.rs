/// In-process messaging bus
///
/// This module implements the two channel kinds the application is built on:
/// - **Broadcast**: one-to-many, topic-filtered, fire-and-forget distribution
///   of (topic, payload) frames.
/// - **Queue**: one-to-one, ordered, exactly-once delivery of structured
///   command objects to a single consumer.
///
/// ## Architecture
///
/// ```text
/// ┌──────────┐    push     ┌───────────────┐    recv     ┌───────────────┐
/// │ Front    │ ──────────> │ Command queue │ ──────────> │ CommandWorker │
/// │ end      │             │ (Pusher/      │             │ (Controller)  │
/// └──────────┘             │  Puller)      │             └───────┬───────┘
///      ▲                   └───────────────┘                     │ set_state
///      │                                                         ▼
/// ┌────┴────────┐   recv   ┌───────────────┐   publish   ┌──────────────┐
/// │ TopicWorker │ <─────── │ Broadcast     │ <────────── │    Model     │
/// │ (UI mailbox)│          │ (Publisher/   │             │              │
/// └─────────────┘          │  Subscriber)  │             └──────────────┘
/// ```
///
/// Both application threads only ever touch the bus; they never share a
/// mutable object directly. Channel endpoints are bound by name through an
/// explicit [`Bus`] registry rather than ambient global state.
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = Bus::new();
///
/// // Broadcast side
/// let publisher = bus.bind_publisher("events")?;
/// let subscriber = publisher.subscribe(Subscription::topics(["state"]));
/// publisher.publish("state", "A")?;
/// let (topic, payload) = subscriber.recv()?;
///
/// // Queue side
/// let pusher = bus.bind_pusher::<Command>("command")?;
/// let puller = pusher.attach()?;
/// pusher.push(&Command::Quit)?;
/// let command = puller.recv()?;
/// ```

pub mod pubsub;
pub mod pushpull;
pub mod registry;
pub mod worker;

// Re-export commonly used types
pub use pubsub::{Publisher, Subscriber, SubscriberId, Subscription};
pub use pushpull::{Puller, Pusher};
pub use registry::Bus;
pub use worker::{CommandWorker, Flow, TopicHandlers, TopicWorker, Worker};
