//! # Bridge
//!
//! Symmetric RPC between two isolated contexts joined by a string channel.
//!
//! ## Philosophy
//!
//! - **Symmetric**: Each side exposes a [`LocalObject`] and calls the other
//!   side through a [`RemoteProxy`]; there is no client or server
//! - **Correlated, not ordered**: Replies are matched to calls by key, so
//!   they may arrive in any order
//! - **Always settles**: Every outbound call ends exactly once, with a
//!   result, a remote failure, or `REMOTE_TIMEOUT`
//! - **Never throws into the transport**: Malformed traffic and internal
//!   failures go to the unexpected-error observer and the bridge keeps running
//!
//! ## Architecture
//!
//! - [`Channel`]: caller-supplied transport (send + one listener)
//! - [`table::CorrelationTable`]: pending outbound calls by key
//! - [`Bridge`]: wires the channel's listener to envelope dispatch and
//!   runs local methods for the remote side
//!
//! Wire envelopes live in the `bridge_codec` crate.

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod interface;
pub mod local;
pub mod memory;
pub mod proxy;
pub mod table;

pub use bridge_codec::{describe_error, MethodError, BRIDGE_PREFIX};
pub use bridge_types::{BridgeId, CallKey, ErrorCode, Value};
pub use channel::{Channel, FnChannel, Listener};
pub use config::{
    BridgeConfig, InvokeObserver, Observers, RemoteErrorObserver, UnexpectedErrorObserver,
    DEFAULT_TIMEOUT_MS,
};
pub use engine::{Bridge, BridgeBuilder};
pub use error::{BridgeError, ChannelError, RemoteError};
pub use local::{LocalObject, Method, MethodFuture};
pub use memory::MemoryChannel;
pub use proxy::{PendingReply, RemoteMethod, RemoteProxy};
