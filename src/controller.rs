use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::TransitionError;
use crate::model::Model;
use crate::state::AppState;

/// Controller validating requested transitions against the legal table
///
/// Runs on the command worker's thread, which is the sole mutator of the
/// Model's state. A rejected transition is returned to the caller; routing
/// it to the error broadcast is the caller's job, so the failure never
/// escapes the worker thread.
pub struct Controller {
    model: Arc<Model>,
    latency: Duration,
}

impl Controller {
    /// Create a controller over `model`; `latency` is the simulated
    /// processing cost of committing a transition
    pub fn new(model: Arc<Model>, latency: Duration) -> Self {
        Self { model, latency }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Validate and commit a transition to `new_state`.
    ///
    /// On a legal (current, new) pair the commit happens after the simulated
    /// latency, via the Model so the change is broadcast. On an illegal pair
    /// the state is left untouched and the error carries both states.
    pub fn attempt_transition(&self, new_state: AppState) -> Result<(), TransitionError> {
        let old_state = self.model.state();

        if !old_state.can_transition_to(new_state) {
            return Err(TransitionError::InvalidTransition {
                from: old_state,
                to: new_state,
            });
        }

        info!("transition {old_state} -> {new_state}");
        thread::sleep(self.latency);

        if let Err(e) = self.model.set_state(new_state) {
            warn!("state committed but broadcast failed: {e}");
        }
        Ok(())
    }
}
