use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, error, trace, warn};

use super::pubsub::Subscriber;
use super::pushpull::Puller;
use crate::error::BusError;

/// Background workers
///
/// A worker owns one receiving endpoint (a Subscriber or a Puller) and runs a
/// receive-dispatch loop on a dedicated thread, decoupling slow handler logic
/// from the thread that produced the message. Handlers execute on the
/// worker's thread; anything that must reach the front-end thread goes back
/// through a channel it drains itself.
///
/// Every receive is a bounded wait at the configured poll interval, so a
/// stop request takes effect at the next tick even with no message in
/// flight. A handler failure or panic is confined to the message that caused
/// it; the loop keeps draining, because a dead worker thread would leave its
/// endpoint permanently undrained.

/// Handler outcome controlling the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep draining the endpoint
    Continue,
    /// Clear the running flag and exit after this message
    Stop,
}

type TopicHandler = Box<dyn FnMut(&str) -> anyhow::Result<Flow> + Send>;

/// Explicit mapping from topic name to handler, registered at worker
/// construction.
///
/// Topics without a handler are dropped at trace level; a subscriber is
/// allowed to care about a subset of what its filter lets through.
pub struct TopicHandlers {
    handlers: HashMap<String, TopicHandler>,
}

impl TopicHandlers {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `topic`, replacing any previous registration
    pub fn on<S, F>(mut self, topic: S, handler: F) -> Self
    where
        S: Into<String>,
        F: FnMut(&str) -> anyhow::Result<Flow> + Send + 'static,
    {
        self.handlers.insert(topic.into(), Box::new(handler));
        self
    }

    /// Number of registered topics
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn dispatch(&mut self, topic: &str, payload: &str) -> Option<anyhow::Result<Flow>> {
        self.handlers.get_mut(topic).map(|handler| handler(payload))
    }
}

impl Default for TopicHandlers {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running background worker thread
pub struct Worker {
    name: String,
    running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn spawn_loop<F>(name: &str, body: F) -> Result<Self, BusError>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(flag))
            .map_err(BusError::ThreadSpawnFailed)?;

        Ok(Self {
            name: name.to_string(),
            running,
            thread: Some(thread),
        })
    }

    /// The worker's thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the dispatch loop is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request a cooperative stop; takes effect at the next poll tick
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Block until the worker's thread exits on its own (a handler returned
    /// [`Flow::Stop`] or the endpoint disconnected)
    pub fn join(mut self) {
        self.join_thread();
    }

    /// Signal stop and block until the worker's thread has exited
    pub fn stop_and_join(mut self) {
        self.stop();
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("worker '{}' thread terminated abnormally", self.name);
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Signal stop so an abandoned handle does not leak a spinning thread;
        // the thread itself exits at its next poll tick
        self.stop();
    }
}

/// Worker draining a broadcast Subscriber into per-topic handlers
pub struct TopicWorker;

impl TopicWorker {
    /// Spawn a dedicated thread running the receive-dispatch loop until the
    /// running flag clears or the publisher goes away
    pub fn spawn(
        name: &str,
        subscriber: Subscriber,
        mut handlers: TopicHandlers,
        poll: Duration,
    ) -> Result<Worker, BusError> {
        Worker::spawn_loop(name, move |running| {
            debug!("topic worker started");

            while running.load(Ordering::SeqCst) {
                match subscriber.recv_timeout(poll) {
                    Ok(Some((topic, payload))) => {
                        dispatch_topic(&mut handlers, &running, &topic, &payload)
                    }
                    Ok(None) => {} // poll tick, re-check the running flag
                    Err(BusError::Disconnected) => {
                        debug!("publisher gone, topic worker exiting");
                        break;
                    }
                    Err(e) => warn!("dropping undecodable broadcast frame: {e}"),
                }
            }

            debug!("topic worker stopped");
        })
    }
}

fn dispatch_topic(
    handlers: &mut TopicHandlers,
    running: &AtomicBool,
    topic: &str,
    payload: &str,
) {
    match catch_unwind(AssertUnwindSafe(|| handlers.dispatch(topic, payload))) {
        Ok(Some(Ok(Flow::Continue))) => {}
        Ok(Some(Ok(Flow::Stop))) => running.store(false, Ordering::SeqCst),
        Ok(Some(Err(e))) => warn!("handler for topic '{topic}' failed: {e:#}"),
        Ok(None) => trace!("no handler for topic '{topic}', dropping message"),
        Err(_) => error!("handler for topic '{topic}' panicked, loop continues"),
    }
}

/// Worker draining a command Puller into a single handler
pub struct CommandWorker;

impl CommandWorker {
    /// Spawn a dedicated thread delivering every decoded command to
    /// `handler` until the running flag clears or the queue closes
    pub fn spawn<T, F>(
        name: &str,
        puller: Puller<T>,
        mut handler: F,
        poll: Duration,
    ) -> Result<Worker, BusError>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(T) -> anyhow::Result<Flow> + Send + 'static,
    {
        Worker::spawn_loop(name, move |running| {
            debug!("command worker started");

            while running.load(Ordering::SeqCst) {
                match puller.recv_timeout(poll) {
                    Ok(Some(command)) => {
                        match catch_unwind(AssertUnwindSafe(|| handler(command))) {
                            Ok(Ok(Flow::Continue)) => {}
                            Ok(Ok(Flow::Stop)) => running.store(false, Ordering::SeqCst),
                            Ok(Err(e)) => warn!("command handler failed: {e:#}"),
                            Err(_) => error!("command handler panicked, loop continues"),
                        }
                    }
                    Ok(None) => {} // poll tick, re-check the running flag
                    Err(BusError::Disconnected) => {
                        debug!("queue closed, command worker exiting");
                        break;
                    }
                    Err(e) => warn!("dropping undecodable command: {e}"),
                }
            }

            debug!("command worker stopped");
        })
    }
}
