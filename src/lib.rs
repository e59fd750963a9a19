//! statebus: an in-process messaging bus with background workers.
//!
//! Decouples a responsive front-end thread from slower worker threads using
//! two channel kinds: a topic-filtered broadcast (Publisher/Subscriber) and a
//! single-consumer command queue (Pusher/Puller), both bound by name through
//! an explicit [`bus::Bus`] registry. Background workers drain one endpoint
//! each on a dedicated thread and dispatch to explicitly registered handlers.
//!
//! The sample payload is a three-state machine: a [`model::Model`] that
//! broadcasts every mutation and a [`controller::Controller`] that validates
//! transitions against a fixed table.

pub mod bus;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod state;

// Re-export commonly used types
pub use bus::{
    Bus, CommandWorker, Flow, Publisher, Puller, Pusher, Subscriber, Subscription, TopicHandlers,
    TopicWorker, Worker,
};
pub use command::Command;
pub use config::Config;
pub use controller::Controller;
pub use error::{AppResult, BusError, ConfigError, TransitionError};
pub use model::{Model, SYSTEM_QUIT, TOPIC_ERROR, TOPIC_STATE, TOPIC_SYSTEM};
pub use state::AppState;
