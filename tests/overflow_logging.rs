//! Overflow logging integration tests
//!
//! Each dropped push emits exactly one warning. These tests install a
//! capturing `log` backend, so they live in their own test binary.

use eventq::queue::api::{aggregator, PausableQueue, PushOutcome, QueueOptions};
use serial_test::serial;
use std::sync::{Mutex, Once};

struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

fn install_logger() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger in this test binary");
        log::set_max_level(log::LevelFilter::Trace);
    });
    LOGGER.records.lock().unwrap().clear();
}

/// Warnings mentioning the named queue
fn warnings_for(queue: &str) -> Vec<String> {
    let needle = format!("Queue '{}'", queue);
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, message)| *level == log::Level::Warn && message.contains(&needle))
        .map(|(_, message)| message.clone())
        .collect()
}

#[test]
#[serial]
fn test_each_dropped_push_warns_once() {
    const MAX: usize = 4;
    const EXTRA: usize = 3;

    install_logger();
    let queue = PausableQueue::with_options(QueueOptions::new().name("overflow").max_size(MAX));

    let dropped = (0..MAX + EXTRA)
        .map(|i| queue.push(i))
        .filter(|outcome| *outcome == PushOutcome::Dropped)
        .count();

    let warnings = warnings_for("overflow");
    assert_eq!(dropped, EXTRA);
    assert_eq!(warnings.len(), EXTRA, "warnings: {:?}", warnings);
    assert!(warnings[0].contains("max size: 4"));
}

#[test]
#[serial]
fn test_accepted_and_merged_pushes_do_not_warn() {
    install_logger();
    let queue = PausableQueue::with_options(
        QueueOptions::new()
            .name("quiet")
            .max_size(1)
            .aggregator(aggregator::dedup::<u32>()),
    );

    assert_eq!(queue.push(1), PushOutcome::Appended);
    assert_eq!(queue.push(1), PushOutcome::Merged);
    assert_eq!(queue.pull(), Some(1));
    assert_eq!(queue.push(2), PushOutcome::Appended);

    assert!(warnings_for("quiet").is_empty());
}
