use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use tracing::{info, warn};

use statebus::{
    AppState, Bus, Command, CommandWorker, Config, Controller, Flow, Model, Subscription,
    TopicHandlers, TopicWorker, SYSTEM_QUIT, TOPIC_ERROR, TOPIC_STATE, TOPIC_SYSTEM,
};

const LOG_TARGET_STARTUP: &str = "statebus::startup";

/// Initialize tracing with file rotation
///
/// Logs are written to:
/// - macOS: ~/Library/Application Support/statebus/logs/
/// - Windows: %APPDATA%/statebus/logs/
/// - Linux: ~/.config/statebus/logs/
///
/// Log rotation:
/// - Daily rotation (new file each day)
///
/// Log output:
/// - Debug builds: Console + File
/// - Release builds: File only
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Get log directory in user config folder
    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("statebus").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    // Create log directory if it doesn't exist
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    // Create file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "statebus.log");

    // Configure filter (info level by default)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // In debug builds, also log to console
    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    // In release builds, only log to file
    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

/// Events marshalled from worker threads back to the front-end thread.
///
/// Workers never touch front-end state directly; they send into this mailbox
/// and the front-end loop drains it.
#[derive(Debug)]
enum UiEvent {
    StateChanged(String),
    Error(String),
    Busy(bool),
}

fn main() -> Result<()> {
    initialize_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(target: LOG_TARGET_STARTUP, "Starting statebus demo v{version}");

    let config = Config::load_or_default();
    info!(
        target: LOG_TARGET_STARTUP,
        "Channels: broadcast '{}', queue '{}'; poll {}ms, transition latency {}ms",
        config.events_channel,
        config.command_queue,
        config.worker_poll_ms,
        config.transition_latency_ms
    );

    run_demo(&config)
}

fn run_demo(config: &Config) -> Result<()> {
    let bus = Bus::new();

    let model = Arc::new(Model::new(bus.bind_publisher(&config.events_channel)?));
    let controller = Controller::new(Arc::clone(&model), config.transition_latency());
    let command = bus.bind_pusher::<Command>(&config.command_queue)?;

    // Front-end mailbox, drained only by this thread
    let (ui_tx, ui_rx) = unbounded::<UiEvent>();

    // Broadcast side: model events -> mailbox
    let subscriber = model.subscribe(Subscription::topics([
        TOPIC_STATE,
        TOPIC_SYSTEM,
        TOPIC_ERROR,
    ]));
    let handlers = {
        let state_tx = ui_tx.clone();
        let error_tx = ui_tx.clone();
        TopicHandlers::new()
            .on(TOPIC_STATE, move |payload: &str| {
                state_tx.send(UiEvent::StateChanged(payload.to_string()))?;
                Ok(Flow::Continue)
            })
            .on(TOPIC_ERROR, move |payload: &str| {
                error_tx.send(UiEvent::Error(payload.to_string()))?;
                Ok(Flow::Continue)
            })
            .on(TOPIC_SYSTEM, |payload: &str| {
                if payload == SYSTEM_QUIT {
                    Ok(Flow::Stop)
                } else {
                    Ok(Flow::Continue)
                }
            })
    };
    let event_worker = TopicWorker::spawn("model-events", subscriber, handlers, config.worker_poll())?;

    // Queue side: commands -> controller
    let puller = command.attach()?;
    let busy_tx = ui_tx.clone();
    let command_worker = CommandWorker::spawn(
        "commands",
        puller,
        move |cmd: Command| match cmd {
            Command::SetState { state } => {
                busy_tx.send(UiEvent::Busy(true))?;
                let outcome = state
                    .parse::<AppState>()
                    .and_then(|next| controller.attempt_transition(next));
                if let Err(e) = outcome {
                    // Route the failure to the error broadcast instead of
                    // letting it escape the worker thread
                    controller.model().send_error(&e.to_string())?;
                }
                busy_tx.send(UiEvent::Busy(false))?;
                Ok(Flow::Continue)
            }
            Command::Quit => Ok(Flow::Stop),
        },
        config.worker_poll(),
    )?;

    // Scripted front end standing in for the button row: one legal
    // transition, one illegal, one legal again
    for target in ["B", "B", "C"] {
        command.push(&Command::SetState {
            state: target.to_string(),
        })?;
    }

    // Drain the mailbox until the workers go quiet
    let quiet = config.transition_latency() + Duration::from_secs(1);
    loop {
        match ui_rx.recv_timeout(quiet) {
            Ok(UiEvent::StateChanged(state)) => info!("state label -> {state}"),
            Ok(UiEvent::Error(message)) => warn!("error dialog: {message}"),
            Ok(UiEvent::Busy(busy)) => info!("buttons {}", if busy { "disabled" } else { "enabled" }),
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Coordinated teardown: quit sentinels first, then join both workers
    model.send_system(SYSTEM_QUIT)?;
    command.push(&Command::Quit)?;
    command_worker.stop_and_join();
    event_worker.stop_and_join();
    bus.close();

    info!("demo finished in state {}", model.state());
    Ok(())
}
