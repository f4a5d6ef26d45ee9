//! Failures raised by local methods, and their transmissible description

use bridge_types::{ErrorCode, Value};
use serde::Serialize;
use std::fmt;

/// Description used when a method fails without any detail
pub const EMPTY_ERROR: &str = "[Empty Error]";

/// Description used when a failure cannot be rendered at all
pub const UNKNOWN_ERROR: &str = "[Unknown Error]";

/// The ways a local method can fail
///
/// Any `std::error::Error` converts into [`MethodError::Named`], so
/// handlers can use `?` on ordinary fallible calls.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodError {
    /// Failed with nothing attached
    Empty,
    /// Failed with a kind (e.g. `Error`, `TypeError`) and a message
    Named { kind: String, message: String },
    /// Failed with an arbitrary structured value
    Value(Value),
    /// Failed with something that has no structured form
    Unserializable,
    /// The method ran but its return value could not be encoded
    InvalidReturn(String),
}

impl MethodError {
    /// A plain `Error` with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    pub fn named(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Named {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Captures a structured value, or [`MethodError::Unserializable`] if
    /// the value cannot be represented
    pub fn value<T: Serialize + ?Sized>(value: &T) -> Self {
        serde_json::to_value(value)
            .map(Self::Value)
            .unwrap_or(Self::Unserializable)
    }

    /// The code an error reply for this failure carries
    pub fn error_code(&self) -> ErrorCode {
        match self {
            MethodError::InvalidReturn(_) => ErrorCode::InvalidReturn,
            _ => ErrorCode::RemoteRuntimeError,
        }
    }
}

impl<E: std::error::Error> From<E> for MethodError {
    fn from(err: E) -> Self {
        Self::named(short_type_name::<E>(), err.to_string())
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe_error(self))
    }
}

/// Renders a failure as a short message for an error reply
///
/// Named failures become `[<kind>]: <message>`, structured values become
/// their JSON text. This never fails.
pub fn describe_error(error: &MethodError) -> String {
    match error {
        MethodError::Empty | MethodError::Value(Value::Null) => EMPTY_ERROR.to_string(),
        MethodError::Named { kind, message } => format!("[{}]: {}", kind, message),
        MethodError::InvalidReturn(message) => format!("[InvalidReturn]: {}", message),
        MethodError::Value(value) => {
            serde_json::to_string(value).unwrap_or_else(|_| UNKNOWN_ERROR.to_string())
        }
        MethodError::Unserializable => UNKNOWN_ERROR.to_string(),
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
