//! Error types for instruction application and session I/O

use crate::channel::ChannelError;
use crate::dom::DomError;
use crate::mirror::MirrorError;
use crate::navigation::HistoryError;
use tether_protocol::{Path, ProtocolError};
use thiserror::Error;

/// Why one instruction could not be applied. Always a protocol violation
/// from the client's point of view.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    #[error("Index {index} out of range under {parent} ({len} children)")]
    IndexOutOfRange {
        parent: Path,
        index: usize,
        len: usize,
    },

    #[error("Attribute `{key}` is not set on node at {target}")]
    MissingAttribute { target: Path, key: String },

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] HistoryError),
}

/// A batch stopped early. Instructions before `applied` stay applied.
#[derive(Error, Debug)]
#[error("Batch aborted after {applied} instruction(s): {cause}")]
pub struct BatchError {
    pub applied: usize,
    #[source]
    pub cause: PatchError,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] HistoryError),
}
