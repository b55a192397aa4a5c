//! Checks that the subsystem macros land on the targets their flags filter on.

use std::sync::{Arc, Mutex};

use logging::{DebugFlag, VerbosityConfig};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<(String, Level)>>>,
}

impl Recorder {
    fn take(&self) -> Vec<(String, Level)> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        self.events
            .lock()
            .unwrap()
            .push((meta.target().to_owned(), *meta.level()));
    }
}

fn emit_one_of_each() {
    logging::trace_open!(path = "a.bin", "opened");
    logging::trace_submit!(offset = 0u64, len = 4usize, "read accepted");
    logging::trace_reject!(reason = "busy", "submission rejected");
    logging::trace_complete!(transferred = 4usize, "read complete");
    logging::trace_close!(flush = true, "close executed");
    logging::trace_queue!(queue = "q", "delivered");
    logging::trace_engine!(workers = 2usize, "engine started");
    logging::warn_implicit_release!(kind = "read", "outcome dropped unreleased");
}

#[test]
fn every_macro_uses_its_subsystem_target() {
    let recorder = Recorder::default();
    let subscriber = tracing_subscriber::registry()
        .with(VerbosityConfig::from_verbose_level(4).to_env_filter())
        .with(recorder.clone());

    tracing::subscriber::with_default(subscriber, emit_one_of_each);

    let events = recorder.take();
    assert_eq!(events.len(), 8);
    for (target, _) in &events {
        assert!(
            DebugFlag::from_target(target).is_some(),
            "unexpected target {target}"
        );
    }
    assert_eq!(events[0], ("aio::open".to_owned(), Level::DEBUG));
    assert_eq!(events[2], ("aio::submit".to_owned(), Level::INFO));
    assert_eq!(events[3], ("aio::complete".to_owned(), Level::TRACE));
}

#[test]
fn default_verbosity_only_shows_unreleased_outcomes() {
    let recorder = Recorder::default();
    let subscriber = tracing_subscriber::registry()
        .with(VerbosityConfig::from_verbose_level(0).to_env_filter())
        .with(recorder.clone());

    tracing::subscriber::with_default(subscriber, emit_one_of_each);

    assert_eq!(
        recorder.take(),
        vec![("aio::queue".to_owned(), Level::WARN)]
    );
}

#[test]
fn debug_list_raises_a_single_subsystem() {
    let mut config = VerbosityConfig::default();
    config.apply_debug_list("close2").unwrap();

    let recorder = Recorder::default();
    let subscriber = tracing_subscriber::registry()
        .with(config.to_env_filter())
        .with(recorder.clone());

    tracing::subscriber::with_default(subscriber, emit_one_of_each);

    let targets: Vec<String> = recorder.take().into_iter().map(|(t, _)| t).collect();
    assert_eq!(targets, vec!["aio::close".to_owned(), "aio::queue".to_owned()]);
}
