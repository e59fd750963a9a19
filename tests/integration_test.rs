// Integration tests for statebus
// These tests drive the full pipeline: command queue -> worker -> controller
// -> model -> broadcast -> subscriber

use std::sync::Arc;
use std::time::Duration;

use statebus::{
    AppState, Bus, Command, CommandWorker, Controller, Flow, Model, Pusher, Subscriber,
    Subscription, TopicHandlers, TopicWorker, Worker, SYSTEM_QUIT, TOPIC_ERROR, TOPIC_STATE,
    TOPIC_SYSTEM,
};

const POLL: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(100);

struct Pipeline {
    model: Arc<Model>,
    command: Pusher<Command>,
    worker: Worker,
}

/// Compose the reference wiring: a command worker feeding the controller,
/// which mutates the model, which broadcasts. Transition latency is zero to
/// keep the tests fast.
fn pipeline(initial: AppState) -> Pipeline {
    let bus = Bus::new();
    let model = Arc::new(Model::with_state(
        bus.bind_publisher("events").unwrap(),
        initial,
    ));
    let controller = Controller::new(Arc::clone(&model), Duration::ZERO);
    let command = bus.bind_pusher::<Command>("command").unwrap();
    let puller = command.attach().unwrap();

    let worker = CommandWorker::spawn(
        "commands",
        puller,
        move |cmd: Command| match cmd {
            Command::SetState { state } => {
                let outcome = state
                    .parse::<AppState>()
                    .and_then(|next| controller.attempt_transition(next));
                if let Err(e) = outcome {
                    controller.model().send_error(&e.to_string())?;
                }
                Ok(Flow::Continue)
            }
            Command::Quit => Ok(Flow::Stop),
        },
        POLL,
    )
    .unwrap();

    Pipeline {
        model,
        command,
        worker,
    }
}

fn set_state(pusher: &Pusher<Command>, state: &str) {
    pusher
        .push(&Command::SetState {
            state: state.to_string(),
        })
        .unwrap();
}

fn assert_quiet(subscriber: &Subscriber) {
    assert!(
        subscriber.recv_timeout(QUIET).unwrap().is_none(),
        "expected no further broadcasts"
    );
}

#[test]
fn test_legal_transition_broadcasts_state_and_no_error() {
    let p = pipeline(AppState::A);
    let state_sub = p.model.subscribe(Subscription::topics([TOPIC_STATE]));
    let error_sub = p.model.subscribe(Subscription::topics([TOPIC_ERROR]));

    set_state(&p.command, "B");

    let (topic, payload) = state_sub.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(topic, TOPIC_STATE);
    assert_eq!(payload, "B");
    assert_eq!(p.model.state(), AppState::B);

    assert_quiet(&error_sub);
    p.worker.stop_and_join();
}

#[test]
fn test_illegal_transition_broadcasts_error_and_no_state() {
    let p = pipeline(AppState::A);
    let state_sub = p.model.subscribe(Subscription::topics([TOPIC_STATE]));
    let error_sub = p.model.subscribe(Subscription::topics([TOPIC_ERROR]));

    set_state(&p.command, "C");

    let (topic, message) = error_sub.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(topic, TOPIC_ERROR);
    assert!(message.contains('A') && message.contains('C'), "{message}");
    assert_eq!(p.model.state(), AppState::A);

    assert_quiet(&state_sub);
    p.worker.stop_and_join();
}

#[test]
fn test_unknown_state_name_is_reported_not_fatal() {
    let p = pipeline(AppState::A);
    let error_sub = p.model.subscribe(Subscription::topics([TOPIC_ERROR]));

    set_state(&p.command, "Z");
    let (_, message) = error_sub.recv_timeout(WAIT).unwrap().unwrap();
    assert!(message.contains('Z'), "{message}");

    // The worker is still draining: a legal transition goes through next
    let state_sub = p.model.subscribe(Subscription::topics([TOPIC_STATE]));
    set_state(&p.command, "B");
    assert_eq!(state_sub.recv_timeout(WAIT).unwrap().unwrap().1, "B");

    p.worker.stop_and_join();
}

#[test]
fn test_full_cycle_in_order() {
    let p = pipeline(AppState::A);
    let state_sub = p.model.subscribe(Subscription::topics([TOPIC_STATE]));

    for target in ["B", "C", "A"] {
        set_state(&p.command, target);
    }

    for expected in ["B", "C", "A"] {
        assert_eq!(
            state_sub.recv_timeout(WAIT).unwrap().unwrap().1,
            expected
        );
    }
    assert_eq!(p.model.state(), AppState::A);

    p.worker.stop_and_join();
}

#[test]
fn test_quit_stops_worker_without_processing_later_commands() {
    let p = pipeline(AppState::A);

    p.command.push(&Command::Quit).unwrap();
    set_state(&p.command, "B");

    // join returns once the quit command is processed; the command pushed
    // after it stays in the queue untouched
    p.worker.join();
    assert_eq!(p.model.state(), AppState::A);
}

#[test]
fn test_system_quit_broadcast_stops_topic_worker() {
    let bus = Bus::new();
    let model = Arc::new(Model::new(bus.bind_publisher("events").unwrap()));

    let subscriber = model.subscribe(Subscription::topics([TOPIC_STATE, TOPIC_SYSTEM]));
    let handlers = TopicHandlers::new().on(TOPIC_SYSTEM, |payload: &str| {
        if payload == SYSTEM_QUIT {
            Ok(Flow::Stop)
        } else {
            Ok(Flow::Continue)
        }
    });
    let worker = TopicWorker::spawn("model-events", subscriber, handlers, POLL).unwrap();

    model.send_system(SYSTEM_QUIT).unwrap();
    worker.join();
}

#[test]
fn test_two_subscribers_observe_identical_sequences() {
    let p = pipeline(AppState::A);
    let sub1 = p.model.subscribe(Subscription::topics([TOPIC_STATE]));
    let sub2 = p.model.subscribe(Subscription::topics([TOPIC_STATE]));

    for target in ["B", "C"] {
        set_state(&p.command, target);
    }

    for expected in ["B", "C"] {
        assert_eq!(sub1.recv_timeout(WAIT).unwrap().unwrap().1, expected);
        assert_eq!(sub2.recv_timeout(WAIT).unwrap().unwrap().1, expected);
    }

    p.worker.stop_and_join();
}
