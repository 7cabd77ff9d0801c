//! Structured error types for callscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

/// Faults raised on the writer thread. Any of these ends the trace; the
/// document is left truncated and the error surfaces at shutdown.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to serialize trace event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write trace document: {0}")]
    Sink(#[from] std::io::Error),
}

/// Faults raised by session lifecycle operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Tracing is already installed for this session")]
    AlreadyInstalled,

    #[error("Tracing was never installed for this session")]
    NotInstalled,

    #[error("Session already shut down; start a new session to trace again")]
    Finished,

    #[error("Failed to spawn trace writer thread: {0}")]
    WriterSpawn(#[source] std::io::Error),

    #[error("Trace writer thread panicked")]
    WriterPanicked,

    #[error(transparent)]
    Writer(#[from] WriterError),
}
