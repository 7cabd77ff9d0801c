//! # Trace Session
//!
//! Controller that wires the probe, the event channel, and the writer
//! thread together, and tears them down in the one order that cannot lose
//! events.
//!
//! ## Shutdown order
//!
//! 1. Uninstall the probe, so no new events are produced.
//! 2. Raise the terminate flag, so the writer logs its switch to draining.
//! 3. Join the writer, which exits once the channel disconnects.
//!
//! The session keeps no sender of its own. The probe and any notifications
//! still in flight hold the only senders, so the channel disconnects exactly
//! when the last racing notification has finished enqueueing.

use std::io::Write;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::unbounded;
use log::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::{SessionError, WriterError};
use crate::hook::{CallProbe, FrameSource};
use crate::writer::TraceWriter;

/// What the session currently owns: the sink before install, the writer
/// thread while tracing, nothing after shutdown.
enum SessionState<W> {
    Idle { sink: W },
    Installed { writer: JoinHandle<Result<W, WriterError>> },
    Finished,
}

/// A single-use tracing run over one host and one sink.
///
/// Install starts recording on every execution context the host reports;
/// shutdown stops recording and returns the sink holding the completed
/// document. A finished session cannot be restarted.
pub struct TraceSession<W: Write + Send + 'static> {
    source: Arc<dyn FrameSource>,
    clock: Arc<dyn Clock>,
    pid: u32,
    terminate: Arc<AtomicBool>,
    state: SessionState<W>,
}

impl<W: Write + Send + 'static> TraceSession<W> {
    /// Session over `source` recording into `sink`, stamped with the system
    /// clock and the current process id.
    #[must_use]
    pub fn new(source: Arc<dyn FrameSource>, sink: W) -> Self {
        Self::with_clock(source, sink, Arc::new(SystemClock))
    }

    /// Same as [`TraceSession::new`] with an explicit time source.
    #[must_use]
    pub fn with_clock(source: Arc<dyn FrameSource>, sink: W, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            pid: std::process::id(),
            terminate: Arc::new(AtomicBool::new(false)),
            state: SessionState::Idle { sink },
        }
    }

    /// Start the writer thread, then install the probe into the host.
    ///
    /// The writer must be consuming before the probe can enqueue, so this
    /// order is fixed.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyInstalled`] while tracing is active,
    /// [`SessionError::Finished`] after shutdown, and
    /// [`SessionError::WriterSpawn`] when the writer thread cannot start.
    /// A spawn failure leaves the session finished and the sink lost.
    pub fn install(&mut self) -> Result<(), SessionError> {
        match mem::replace(&mut self.state, SessionState::Finished) {
            SessionState::Idle { sink } => {
                // Unbounded: memory growth under a call-heavy program is the
                // accepted cost of never dropping an event.
                let (event_tx, event_rx) = unbounded();
                let writer = TraceWriter::new(event_rx, Arc::clone(&self.terminate), sink);
                let handle = thread::Builder::new()
                    .name("trace-writer".to_owned())
                    .spawn(move || writer.run())
                    .map_err(SessionError::WriterSpawn)?;

                let probe = CallProbe::new(event_tx, Arc::clone(&self.clock), self.pid);
                self.source.install(Arc::new(probe));
                self.state = SessionState::Installed { writer: handle };
                debug!("Tracing installed for pid {}", self.pid);
                Ok(())
            }
            state @ SessionState::Installed { .. } => {
                self.state = state;
                Err(SessionError::AlreadyInstalled)
            }
            SessionState::Finished => Err(SessionError::Finished),
        }
    }

    /// Stop tracing and return the sink with the completed document in it.
    ///
    /// Uninstalls the probe first so event production stops, then joins the
    /// writer, which exits after writing everything enqueued up to that
    /// point. Flushing or closing the returned sink stays with the caller.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInstalled`] before [`TraceSession::install`],
    /// [`SessionError::Finished`] on a second shutdown, the writer's own
    /// fault when the trace died early, and
    /// [`SessionError::WriterPanicked`] if the writer thread did.
    pub fn shutdown(&mut self) -> Result<W, SessionError> {
        match mem::replace(&mut self.state, SessionState::Finished) {
            SessionState::Installed { writer } => {
                self.source.uninstall();
                self.terminate.store(true, Ordering::Relaxed);
                match writer.join() {
                    Ok(Ok(sink)) => {
                        debug!("Trace session closed");
                        Ok(sink)
                    }
                    Ok(Err(fault)) => Err(SessionError::Writer(fault)),
                    Err(_) => Err(SessionError::WriterPanicked),
                }
            }
            state @ SessionState::Idle { .. } => {
                self.state = state;
                Err(SessionError::NotInstalled)
            }
            SessionState::Finished => Err(SessionError::Finished),
        }
    }

    /// Install, returning a guard that shuts the session down when it
    /// leaves scope, on the normal and the unwinding path alike.
    ///
    /// # Errors
    ///
    /// Same failures as [`TraceSession::install`].
    pub fn traced(&mut self) -> Result<TraceGuard<'_, W>, SessionError> {
        self.install()?;
        Ok(TraceGuard { session: self, finished: false })
    }
}

impl<W: Write + Send + 'static> Drop for TraceSession<W> {
    fn drop(&mut self) {
        if !matches!(self.state, SessionState::Installed { .. }) {
            return;
        }
        // Close the document even when the session is just dropped; the
        // sink itself is unrecoverable on this path.
        if let Err(fault) = self.shutdown() {
            warn!("Trace session dropped while installed; shutdown failed: {fault}");
        }
    }
}

/// Scope guard returned by [`TraceSession::traced`]. Dropping it shuts the
/// session down; [`TraceGuard::finish`] does the same while handing back the
/// sink and any shutdown fault.
pub struct TraceGuard<'a, W: Write + Send + 'static> {
    session: &'a mut TraceSession<W>,
    finished: bool,
}

impl<W: Write + Send + 'static> TraceGuard<'_, W> {
    /// End the traced region and take the sink back.
    ///
    /// # Errors
    ///
    /// Same failures as [`TraceSession::shutdown`].
    pub fn finish(mut self) -> Result<W, SessionError> {
        self.finished = true;
        self.session.shutdown()
    }
}

impl<W: Write + Send + 'static> Drop for TraceGuard<'_, W> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(fault) = self.session.shutdown() {
            warn!("Traced region ended but shutdown failed: {fault}");
        }
    }
}
