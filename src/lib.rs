//! # callscope - Streaming Call Tracer
//!
//! callscope records every function call and return reported by a host
//! runtime and streams them, while the program is still running, into a
//! Chrome Trace Event Format document. Open the result in Perfetto or
//! `chrome://tracing` to see a per-thread flame chart of where the time
//! went.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Host Runtime                           │
//! │   every execution context reports call/return events       │
//! └───────────────────────┬────────────────────────────────────┘
//!                         │ FrameSource / FrameObserver
//!                         ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │                  callscope (This Crate)                    │
//! │                                                            │
//! │  ┌───────────┐    unbounded     ┌──────────────┐          │
//! │  │ CallProbe │───▶ channel ────▶│ TraceWriter  │          │
//! │  │  (hook)   │                  │ (own thread) │          │
//! │  └───────────┘                  └──────┬───────┘          │
//! │        ▲                               │ JSON records     │
//! │        │ install / uninstall           ▼                  │
//! │  ┌───────────────┐              ┌──────────────┐          │
//! │  │ TraceSession  │              │ sink (Write) │          │
//! │  │ (controller)  │              │ [{...}, {}]  │          │
//! │  └───────────────┘              └──────────────┘          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The hook runs inline on whichever thread the host notifies and does
//! nothing beyond stamping and enqueueing the event; serialization and
//! sink I/O happen only on the dedicated writer thread. Traced threads
//! never block on I/O, and per-thread event order is preserved end to end.
//!
//! ## Module Structure
//!
//! - [`session`]: [`TraceSession`] lifecycle controller and scope guard
//! - [`hook`]: host-facing traits and the [`CallProbe`] observer
//! - [`writer`]: writer thread, document framing, termination handling
//! - [`event`]: Chrome Trace Event Format records
//! - [`clock`]: time sources, injectable for deterministic tests
//! - [`errors`]: structured error types
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use callscope::{FrameObserver, FrameSource, TraceSession};
//!
//! // Stand-in for a real host runtime integration.
//! struct NullHost;
//!
//! impl FrameSource for NullHost {
//!     fn install(&self, _observer: Arc<dyn FrameObserver>) {}
//!     fn uninstall(&self) {}
//! }
//!
//! # fn main() -> Result<(), callscope::SessionError> {
//! let mut session = TraceSession::new(Arc::new(NullHost), Vec::<u8>::new());
//! session.install()?;
//! // ... calls reported by the host are recorded here ...
//! let sink = session.shutdown()?;
//! assert_eq!(sink, b"[{}]");
//! # Ok(())
//! # }
//! ```

// Wire types deliberately carry their module's name (event::TraceEvent)
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod errors;
pub mod event;
pub mod hook;
pub mod session;
pub mod writer;

pub use clock::{Clock, SystemClock};
pub use errors::{SessionError, WriterError};
pub use event::{EventArgs, Phase, TraceEvent};
pub use hook::{CallProbe, CallSite, FrameEventKind, FrameInfo, FrameObserver, FrameSource};
pub use session::{TraceGuard, TraceSession};
pub use writer::{TraceWriter, WriterState, WRITE_SYMBOL};
