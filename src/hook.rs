//! # Call Hook
//!
//! Converts host call/return notifications into [`TraceEvent`] records and
//! enqueues them for the writer thread.
//!
//! ## Host contract
//!
//! The host runtime exposes its notification capability as a [`FrameSource`].
//! Installing a [`FrameObserver`] makes it current for the whole process:
//! every execution context, including ones spawned later, reports through it.
//! The probe runs inline on the notifying thread: constant work per event
//! and no I/O. Failures never escape into the host.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::clock::{seconds_to_micros, Clock};
use crate::event::{EventArgs, Phase, TraceEvent};
use crate::writer::WRITE_SYMBOL;

/// Kind of notification delivered by the host.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEventKind {
    /// A function was entered on the notifying thread.
    Call,
    /// The innermost function returned on the notifying thread.
    Return,
    /// Anything else the host reports; the probe ignores these.
    Other,
}

/// Position of the frame a notification refers to.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo<'a> {
    /// Symbol of the executing function.
    pub symbol: &'a str,
    /// Unit that defines the function, e.g. a source file path.
    pub unit: &'a str,
    /// Line within `unit` at the time of the notification.
    pub line: u32,
    /// Position of the immediate caller. `None` for outermost frames.
    pub caller: Option<CallSite<'a>>,
}

/// A caller's position within its defining unit.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub unit: &'a str,
    pub line: u32,
}

/// Callback invoked synchronously for every call and return while tracing
/// is installed. Invocations happen on the notifying thread itself, from any
/// number of threads at once.
pub trait FrameObserver: Send + Sync {
    fn on_frame_event(&self, kind: FrameEventKind, frame: &FrameInfo<'_>);
}

/// Host capability for call/return notifications.
pub trait FrameSource: Send + Sync {
    /// Makes `observer` the active observer for the whole process, including
    /// execution contexts spawned after this call.
    fn install(&self, observer: Arc<dyn FrameObserver>);

    /// Stops notifications and drops every host-held reference to the
    /// installed observer. Notifications already in flight may still finish
    /// after this returns.
    fn uninstall(&self);
}

/// The probe installed into a [`FrameSource`]: one notification in, at most
/// one [`TraceEvent`] out.
pub struct CallProbe {
    event_tx: Sender<TraceEvent>,
    clock: Arc<dyn Clock>,
    pid: u32,
}

impl CallProbe {
    /// Create a probe that enqueues onto `event_tx`, stamping events with
    /// `clock` readings and `pid`.
    #[must_use]
    pub fn new(event_tx: Sender<TraceEvent>, clock: Arc<dyn Clock>, pid: u32) -> Self {
        Self { event_tx, clock, pid }
    }

    fn build_event(&self, ph: Phase, frame: &FrameInfo<'_>) -> Option<TraceEvent> {
        // Outermost frames have no caller to attribute; drop them rather
        // than emit a record with a hole in it.
        let caller = frame.caller?;

        Some(TraceEvent {
            name: frame.symbol.to_owned(),
            cat: frame.unit.to_owned(),
            tid: current_thread_label(),
            ph,
            pid: self.pid,
            ts: seconds_to_micros(self.clock.now()),
            args: EventArgs {
                function: format!("{}:{}:{}", frame.unit, frame.line, frame.symbol),
                caller: format!("{}:{}", caller.unit, caller.line),
            },
        })
    }
}

impl FrameObserver for CallProbe {
    fn on_frame_event(&self, kind: FrameEventKind, frame: &FrameInfo<'_>) {
        let ph = match kind {
            FrameEventKind::Call => Phase::Begin,
            FrameEventKind::Return => Phase::End,
            FrameEventKind::Other => return,
        };

        // The writer's own sink calls must never feed the queue the writer
        // drains.
        if frame.symbol == WRITE_SYMBOL {
            return;
        }

        let Some(event) = self.build_event(ph, frame) else {
            return;
        };

        // If the channel is closed the writer is already gone; the probe
        // stays silent either way.
        let _ = self.event_tx.send(event);
    }
}

/// Identifier for the current execution context: the thread's name when it
/// has one, otherwise the debug form of its [`std::thread::ThreadId`]. Unique
/// among concurrently live threads as long as the host does not reuse names.
#[must_use]
pub fn current_thread_label() -> String {
    let thread = std::thread::current();
    thread.name().map_or_else(|| format!("{:?}", thread.id()), str::to_owned)
}
