//! # Envelope Codec
//!
//! This crate defines the wire format spoken over a bridge channel.
//!
//! ## Philosophy
//!
//! - **Shared channels**: Every bridge message starts with [`BRIDGE_PREFIX`];
//!   anything else on the channel belongs to someone else and is left alone
//! - **Structural envelopes**: The three envelope shapes are told apart by
//!   which fields are present, not by a tag
//! - **Failures travel as text**: A failing method is reduced to a short
//!   message by [`describe_error`] before it crosses the channel
//!
//! ## Envelopes
//!
//! - [`Invocation`]: `{"method", "args", "key"}`
//! - [`SuccessReply`]: `{"result", "key"}`
//! - [`ErrorReply`]: `{"errorCode", "errorMessage", "key"}`

pub mod envelope;
pub mod error;
pub mod method_error;

pub use envelope::{
    decode, encode_args, encode_error, encode_invocation, encode_success, Envelope, ErrorReply,
    Invocation, SuccessReply, BRIDGE_PREFIX,
};
pub use error::CodecError;
pub use method_error::{describe_error, MethodError, EMPTY_ERROR, UNKNOWN_ERROR};
