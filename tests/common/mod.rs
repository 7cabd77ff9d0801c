//! Shared test doubles: a scripted host runtime, a deterministic clock, and
//! sinks that stay readable after the session consumes them or fail on cue.

// Each integration test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use callscope::{
    CallSite, Clock, FrameEventKind, FrameInfo, FrameObserver, FrameSource, Phase, TraceEvent,
};
use serde_json::{json, Value};

/// Host runtime double. Tests drive call/return notifications by hand from
/// whichever threads they choose.
#[derive(Default)]
pub struct ScriptedHost {
    observer: Mutex<Option<Arc<dyn FrameObserver>>>,
}

impl ScriptedHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn notify(&self, kind: FrameEventKind, frame: &FrameInfo<'_>) {
        // Clone out of the lock so a notification in flight keeps working
        // while another thread uninstalls.
        let observer = self.observer.lock().unwrap().clone();
        if let Some(observer) = observer {
            observer.on_frame_event(kind, frame);
        }
    }

    pub fn call(&self, symbol: &str, unit: &str, line: u32, caller: (&str, u32)) {
        self.notify(
            FrameEventKind::Call,
            &FrameInfo {
                symbol,
                unit,
                line,
                caller: Some(CallSite { unit: caller.0, line: caller.1 }),
            },
        );
    }

    pub fn ret(&self, symbol: &str, unit: &str, line: u32, caller: (&str, u32)) {
        self.notify(
            FrameEventKind::Return,
            &FrameInfo {
                symbol,
                unit,
                line,
                caller: Some(CallSite { unit: caller.0, line: caller.1 }),
            },
        );
    }
}

impl FrameSource for ScriptedHost {
    fn install(&self, observer: Arc<dyn FrameObserver>) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    fn uninstall(&self) {
        self.observer.lock().unwrap().take();
    }
}

/// Run `body` bracketed by a call and a return notification for `symbol`.
pub fn scripted_call<R>(
    host: &ScriptedHost,
    symbol: &str,
    unit: &str,
    line: u32,
    caller: (&str, u32),
    body: impl FnOnce() -> R,
) -> R {
    host.call(symbol, unit, line, caller);
    let result = body();
    host.ret(symbol, unit, line, caller);
    result
}

/// Clock advancing one microsecond per reading, so timestamps are exact.
#[derive(Default)]
pub struct StepClock {
    micros: AtomicU64,
}

impl Clock for StepClock {
    #[allow(clippy::cast_precision_loss)]
    fn now(&self) -> f64 {
        self.micros.fetch_add(1, Ordering::SeqCst) as f64 / 1_000_000.0
    }
}

/// Write target that hands out clones, so tests can read the document even
/// when the owning sink went down a drop path.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl io::Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Write target with a byte budget. Accepts writes until the budget runs
/// out, then fails every write, like a device filling up mid-trace.
#[derive(Debug)]
pub struct FailingSink {
    budget: usize,
}

impl FailingSink {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }
}

impl io::Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.budget {
            return Err(io::Error::other("sink budget exhausted"));
        }
        self.budget -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Parse a finished document: a JSON array whose last element is the
/// empty-object sentinel. Returns the decoded event records.
pub fn decode_document(bytes: &[u8]) -> Vec<TraceEvent> {
    let doc: Value = serde_json::from_slice(bytes).expect("Trace document must be valid JSON");
    let records = doc.as_array().expect("Trace document must be a JSON array");
    let (sentinel, events) = records.split_last().expect("Document must hold the sentinel");
    assert_eq!(*sentinel, json!({}), "Document must end with the empty-object sentinel");
    events
        .iter()
        .map(|record| serde_json::from_value(record.clone()).expect("Malformed event record"))
        .collect()
}

/// Per-thread stack discipline: every `E` closes the innermost open `B` and
/// nothing stays open at the end.
pub fn assert_stack_discipline(events: &[TraceEvent]) {
    for (tid, stack) in per_thread_open_frames(events) {
        assert!(stack.is_empty(), "Thread {tid} left {} frames open", stack.len());
    }
}

/// Weaker discipline for traces cut mid-call: every `E` still closes the
/// innermost open `B`, but frames may remain open.
pub fn assert_stack_prefix_discipline(events: &[TraceEvent]) {
    per_thread_open_frames(events);
}

fn per_thread_open_frames(events: &[TraceEvent]) -> HashMap<String, Vec<String>> {
    let mut stacks: HashMap<String, Vec<String>> = HashMap::new();
    for event in events {
        let stack = stacks.entry(event.tid.clone()).or_default();
        match event.ph {
            Phase::Begin => stack.push(event.name.clone()),
            Phase::End => {
                let open = stack.pop().expect("End event with no frame open");
                assert_eq!(open, event.name, "End must close the innermost open frame");
            }
        }
    }
    stacks
}

/// Timestamps must never step backwards within one thread's track.
pub fn assert_per_thread_monotonic(events: &[TraceEvent]) {
    let mut last: HashMap<&str, u64> = HashMap::new();
    for event in events {
        if let Some(prev) = last.insert(event.tid.as_str(), event.ts) {
            assert!(event.ts >= prev, "Timestamps went backwards on {}", event.tid);
        }
    }
}
