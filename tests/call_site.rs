#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use taglog::log::{CallStack, LogState, Logger, MemorySink, SinkRegistry, Subject};

fn capture_logger() -> (Logger, Arc<MemorySink>) {
    let registry = Arc::new(SinkRegistry::empty());
    let sink = Arc::new(MemorySink::new(32));
    registry.register(sink.clone());
    (Logger::with_parts(Arc::new(LogState::new()), registry), sink)
}

#[test]
fn capture_sees_this_function() {
    let stack = CallStack::capture();
    assert!(!stack.is_empty());
    // Release builds inline the test body and carry no symbol positions.
    #[cfg(debug_assertions)]
    assert!(
        stack
            .frames()
            .iter()
            .any(|f| f.method == "capture_sees_this_function"),
        "frames: {:?}",
        stack.frames()
    );
}

#[test]
fn tag_points_at_the_calling_file() {
    let (log, sink) = capture_logger();
    log.d("hello");
    let tag = &sink.records()[0].tag;
    assert!(tag.contains("(call_site.rs:"), "tag was {tag}");
    assert!(tag.ends_with('⇛'));
}

#[test]
fn disabled_resolution_uses_caller_location() {
    let (log, sink) = capture_logger();
    log.state().set_resolve_call_site(false);
    let line = line!() + 1;
    log.i("x");
    let tag = &sink.records()[0].tag;
    assert!(tag.starts_with(&format!("(call_site.rs:{line})")), "tag was {tag}");
}

struct Worker;

impl Worker {
    fn run(&self, log: &Logger) {
        log.with(Subject::of_val(self)).i("tick");
    }
}

#[test]
fn subject_tags_by_its_own_frame() {
    let (log, sink) = capture_logger();
    Worker.run(&log);
    let tag = &sink.records()[0].tag;
    if cfg!(debug_assertions) {
        assert!(tag.contains(" run"), "tag was {tag}");
    } else {
        assert!(tag.contains("(call_site.rs:"), "tag was {tag}");
    }
}

struct Absent;

#[test]
fn unmatched_subject_keeps_the_calling_line() {
    let (log, sink) = capture_logger();
    let line = line!() + 1;
    log.with(Subject::of::<Absent>()).i("nobody home");
    let tag = &sink.records()[0].tag;
    assert!(tag.contains(&format!("(call_site.rs:{line})")), "tag was {tag}");
}

#[test]
fn tags_stay_aligned() {
    let (log, sink) = capture_logger();
    log.state().reset_tag_width(0);
    Worker.run(&log);
    log.d("short");
    let records = sink.records();
    let first = records[0].tag.chars().count();
    let second = records[1].tag.chars().count();
    assert!(second >= first);
}

#[test]
fn stamp_leads_the_tag() {
    let (log, sink) = capture_logger();
    log.set_stamp(Some("rc-3"));
    log.w("stamped");
    assert!(sink.records()[0].tag.starts_with("rc-3 ("));
}
