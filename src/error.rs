//! Crate-wide error type.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the remote-UI peripheral.
///
/// Construction and registration errors are returned synchronously to the
/// caller. Decode and index errors occurring while the worker is running are
/// logged and the offending message is dropped; they never terminate the
/// worker.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid control kind \"{0}\"")]
    InvalidKind(String),

    #[error("invalid control color \"{0}\"")]
    InvalidColor(String),

    #[error("invalid orientation \"{0}\"")]
    InvalidOrientation(String),

    #[error("transport registration failed: {0}")]
    Registration(String),

    #[error("worker did not become ready within {0:?}")]
    StartTimeout(Duration),

    #[error("remote UI is already running")]
    AlreadyRunning,

    #[error("cannot add controls while the remote UI is running")]
    LayoutFrozen,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("event addresses control index {0} but no such control is registered")]
    IndexOutOfRange(u8),

    #[error("attribute {0} has no value")]
    NoValue(&'static str),

    #[error("worker thread exited before reporting readiness")]
    WorkerGone,
}

pub type Result<T> = std::result::Result<T, Error>;
