//! Error codes a bridged call can settle with

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure code carried by error replies and rejected calls
///
/// The wire form is the `SCREAMING_SNAKE_CASE` name, e.g. `"REMOTE_TIMEOUT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The callee has no method with the requested name
    InvalidMethod,
    /// The arguments could not be encoded, so nothing was sent
    InvalidArgs,
    /// The return value could not be encoded by the callee or decoded by the caller
    InvalidReturn,
    /// No reply arrived within the configured window
    RemoteTimeout,
    /// The remote method failed
    RemoteRuntimeError,
}

impl ErrorCode {
    /// All codes, in declaration order
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::InvalidMethod,
        ErrorCode::InvalidArgs,
        ErrorCode::InvalidReturn,
        ErrorCode::RemoteTimeout,
        ErrorCode::RemoteRuntimeError,
    ];

    /// Returns the wire name of this code
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMethod => "INVALID_METHOD",
            ErrorCode::InvalidArgs => "INVALID_ARGS",
            ErrorCode::InvalidReturn => "INVALID_RETURN",
            ErrorCode::RemoteTimeout => "REMOTE_TIMEOUT",
            ErrorCode::RemoteRuntimeError => "REMOTE_RUNTIME_ERROR",
        }
    }

    /// Parses a wire name, returning `None` for anything unrecognized
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == name)
    }

    /// Parses a wire name, folding unknown names into `RemoteRuntimeError`
    ///
    /// A peer running a newer code set still produces a rejection the
    /// caller can handle.
    pub fn from_wire_lenient(name: &str) -> Self {
        Self::from_wire(name).unwrap_or(ErrorCode::RemoteRuntimeError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
