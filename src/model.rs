use parking_lot::Mutex;
use tracing::debug;

use crate::bus::{Publisher, Subscriber, Subscription};
use crate::error::BusError;
use crate::state::AppState;

/// Model owning the application state and its event broadcast
///
/// Every state mutation is published on the "state" topic inside the same
/// critical section as the assignment, so no observer ever sees a mutation
/// without its broadcast. The front end never reads the state field
/// directly; it only consumes broadcast snapshots.

/// Topic carrying state snapshots
pub const TOPIC_STATE: &str = "state";
/// Topic carrying lifecycle messages
pub const TOPIC_SYSTEM: &str = "system";
/// Topic carrying user-visible error messages
pub const TOPIC_ERROR: &str = "error";

/// System payload requesting shutdown
pub const SYSTEM_QUIT: &str = "quit";

pub struct Model {
    state: Mutex<AppState>,
    events: Publisher,
}

impl Model {
    /// Create a model in the initial state, broadcasting on `events`
    pub fn new(events: Publisher) -> Self {
        Self::with_state(events, AppState::default())
    }

    pub fn with_state(events: Publisher, initial: AppState) -> Self {
        Self {
            state: Mutex::new(initial),
            events,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AppState {
        *self.state.lock()
    }

    /// Overwrite the state and broadcast it on the "state" topic
    pub fn set_state(&self, new_state: AppState) -> Result<(), BusError> {
        let mut state = self.state.lock();
        *state = new_state;
        debug!("state set to {new_state}");
        self.events.publish(TOPIC_STATE, new_state.as_str())
    }

    /// Attach a subscriber to the model's event broadcast
    pub fn subscribe(&self, filter: Subscription) -> Subscriber {
        self.events.subscribe(filter)
    }

    /// Broadcast a lifecycle message on the "system" topic
    pub fn send_system(&self, message: &str) -> Result<(), BusError> {
        self.events.publish(TOPIC_SYSTEM, message)
    }

    /// Broadcast a user-visible error on the "error" topic
    pub fn send_error(&self, message: &str) -> Result<(), BusError> {
        self.events.publish(TOPIC_ERROR, message)
    }
}
