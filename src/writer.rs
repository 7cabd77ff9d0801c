//! # Trace Writer
//!
//! Dedicated thread that drains the event channel and streams a Chrome
//! Trace Viewer document into a caller-supplied sink.
//!
//! ## Document framing
//!
//! ```text
//! [                 <- document opened before the first event
//! {event record},\n <- one line per event, in channel order
//! {event record},\n
//! {}]               <- empty-object sentinel, then the closing bracket
//! ```
//!
//! The sentinel absorbs the trailing comma of the last record, so the
//! document parses whether it holds a million events or none (`[{}]`).
//!
//! ## Termination
//!
//! The writer stops when the channel disconnects, which happens once the
//! probe and any in-flight notifications have dropped their senders. Channel
//! disconnection is reported only after every queued event has been
//! received, so nothing enqueued before shutdown is lost. The shared
//! `terminate` flag does not end the loop; it marks where `Running` becomes
//! `Draining` in the logs.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::debug;

use crate::errors::WriterError;
use crate::event::TraceEvent;

/// Symbol name under which the sink's own write operation appears to the
/// host. Never recorded: tracing the write that records a trace would feed
/// the pipeline its own output.
pub const WRITE_SYMBOL: &str = "write";

/// Lifecycle of the writer thread. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Constructed, document not yet opened.
    Idle,
    /// Document open, consuming events as they arrive.
    Running,
    /// Termination observed, emptying what the channel still holds.
    Draining,
    /// Document closed. Terminal.
    Closed,
}

/// Streams [`TraceEvent`]s from the channel into `sink` as one JSON
/// document. Owns the receiving half of the channel and the sink until
/// [`TraceWriter::run`] returns the sink to the caller.
pub struct TraceWriter<W> {
    event_rx: Receiver<TraceEvent>,
    terminate: Arc<AtomicBool>,
    sink: W,
    state: WriterState,
}

impl<W: Write> TraceWriter<W> {
    #[must_use]
    pub fn new(event_rx: Receiver<TraceEvent>, terminate: Arc<AtomicBool>, sink: W) -> Self {
        Self { event_rx, terminate, sink, state: WriterState::Idle }
    }

    /// Lifecycle stage the writer is currently in.
    #[must_use]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Write events until every sender is gone, then close the document and hand
    /// the sink back. Flushing and closing the sink stay with the caller.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError`] when serialization or a sink write fails. The
    /// trace ends there and the document is left without its closing
    /// bracket.
    pub fn run(mut self) -> Result<W, WriterError> {
        self.open_document()?;

        while let Ok(event) = self.event_rx.recv() {
            if self.state == WriterState::Running && self.terminate.load(Ordering::Relaxed) {
                debug!("Termination observed with {} events queued", self.event_rx.len());
                self.enter(WriterState::Draining);
            }
            self.write_event(&event)?;
        }

        self.close_document()?;
        Ok(self.sink)
    }

    fn open_document(&mut self) -> Result<(), WriterError> {
        self.sink.write_all(b"[")?;
        self.enter(WriterState::Running);
        Ok(())
    }

    fn write_event(&mut self, event: &TraceEvent) -> Result<(), WriterError> {
        let record = serde_json::to_string(event)?;
        self.sink.write_all(record.as_bytes())?;
        self.sink.write_all(b",\n")?;
        Ok(())
    }

    fn close_document(&mut self) -> Result<(), WriterError> {
        self.sink.write_all(b"{}]")?;
        self.enter(WriterState::Closed);
        Ok(())
    }

    fn enter(&mut self, next: WriterState) {
        let prev = self.state;
        debug!("Trace writer: {prev:?} -> {next:?}");
        self.state = next;
    }
}
