//! The transport contract a bridge runs over
//!
//! A channel moves strings one way at a time. The embedding code supplies
//! it; the bridge only sends on it and registers a single listener.

use crate::ChannelError;
use std::sync::Arc;

/// Inbound message handler registered with a channel
pub type Listener = Box<dyn Fn(String) + Send + Sync>;

pub trait Channel: Send + Sync + 'static {
    /// Sends one message to the other side
    fn send(&self, message: String) -> Result<(), ChannelError>;

    /// Registers the handler for inbound messages
    ///
    /// A bridge calls this exactly once, while it is being built.
    fn register_listener(&self, listener: Listener);
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn send(&self, message: String) -> Result<(), ChannelError> {
        (**self).send(message)
    }

    fn register_listener(&self, listener: Listener) {
        (**self).register_listener(listener)
    }
}

/// A channel built from a send primitive and a listener-registration primitive
pub struct FnChannel<S, R> {
    send: S,
    register: R,
}

impl<S, R> FnChannel<S, R>
where
    S: Fn(String) -> Result<(), ChannelError> + Send + Sync + 'static,
    R: Fn(Listener) + Send + Sync + 'static,
{
    pub fn new(send: S, register: R) -> Self {
        Self { send, register }
    }
}

impl<S, R> Channel for FnChannel<S, R>
where
    S: Fn(String) -> Result<(), ChannelError> + Send + Sync + 'static,
    R: Fn(Listener) + Send + Sync + 'static,
{
    fn send(&self, message: String) -> Result<(), ChannelError> {
        (self.send)(message)
    }

    fn register_listener(&self, listener: Listener) {
        (self.register)(listener)
    }
}
