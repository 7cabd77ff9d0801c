//! Trace event records in Chrome Trace Event Format.
//!
//! Every observed call and return becomes one [`TraceEvent`]. The field
//! names, their declaration order, and the single-letter phase values are a
//! compatibility contract with `chrome://tracing` and Perfetto; renaming any
//! of them breaks existing viewers.

use serde::{Deserialize, Serialize};

/// Phase of a duration event: `B` opens a frame, `E` closes it.
///
/// Viewers pair each `E` with the most recent unmatched `B` on the same
/// `(pid, tid)` track, so emission order per thread must mirror the actual
/// call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Function entry.
    #[serde(rename = "B")]
    Begin,
    /// Function return.
    #[serde(rename = "E")]
    End,
}

/// A single call or return observation, serialized as one JSON object in the
/// trace document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Symbol of the executing function, as reported by the host.
    pub name: String,
    /// Compilation unit that defines the function. Viewers use this as the
    /// event category filter.
    pub cat: String,
    /// Identifier of the execution context that produced the event. Events
    /// sharing a `tid` render on one timeline track.
    pub tid: String,
    /// Whether this record opens or closes the frame.
    pub ph: Phase,
    /// Operating-system process id, identical for every event in a document.
    pub pid: u32,
    /// Capture time in whole microseconds since the Unix epoch.
    pub ts: u64,
    /// Diagnostic payload shown verbatim by viewers.
    pub args: EventArgs,
}

/// Human-readable position data attached to every event. The pipeline never
/// interprets these strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArgs {
    /// `unit:line:symbol` of the executing frame.
    pub function: String,
    /// `unit:line` of the immediate caller.
    pub caller: String,
}
