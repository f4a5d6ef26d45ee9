//! Error types for the bridge engine

use bridge_codec::CodecError;
use bridge_types::{CallKey, ErrorCode};
use thiserror::Error;

/// Failures with no pending call to settle
///
/// These reach the unexpected-error observer; the bridge keeps running.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Correlation key {0} is already pending")]
    KeyInUse(CallKey),

    #[error("Dispatch panicked: {0}")]
    DispatchPanic(String),

    #[error("No tokio runtime available to drive the bridge")]
    NoRuntime,
}

/// Failure reported by a channel's send primitive
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Send failed: {0}")]
    Send(String),
}

/// The rejection a bridged call settles with
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
