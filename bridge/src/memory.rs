//! In-process channel pair
//!
//! Delivery is synchronous: `send` on one end runs the other end's
//! listeners before returning. Every end also keeps a log of what it sent,
//! which makes it handy for asserting wire traffic in tests.

use crate::{Channel, ChannelError, Listener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedListener = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct Endpoint {
    listeners: Mutex<Vec<SharedListener>>,
    sent: Mutex<Vec<String>>,
}

impl Endpoint {
    fn deliver(&self, message: &str) {
        // Listeners may send in turn; never hold the lock while they run.
        let listeners: Vec<SharedListener> = lock(&self.listeners).clone();
        for listener in listeners {
            listener(message.to_string());
        }
    }
}

/// One end of an in-process channel
#[derive(Clone)]
pub struct MemoryChannel {
    local: Arc<Endpoint>,
    peer: Option<Arc<Endpoint>>,
    closed: Arc<AtomicBool>,
}

impl MemoryChannel {
    /// Creates two connected ends
    pub fn pair() -> (MemoryChannel, MemoryChannel) {
        let left = Arc::new(Endpoint::default());
        let right = Arc::new(Endpoint::default());
        let closed = Arc::new(AtomicBool::new(false));

        (
            MemoryChannel {
                local: left.clone(),
                peer: Some(right.clone()),
                closed: closed.clone(),
            },
            MemoryChannel {
                local: right,
                peer: Some(left),
                closed,
            },
        )
    }

    /// Creates an end with nobody on the other side
    ///
    /// Sent messages are only recorded; use [`MemoryChannel::inject`] to play
    /// the remote side by hand.
    pub fn unconnected() -> MemoryChannel {
        MemoryChannel {
            local: Arc::new(Endpoint::default()),
            peer: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Delivers a message to this end's listeners as if the peer sent it
    pub fn inject(&self, message: impl Into<String>) {
        self.local.deliver(&message.into());
    }

    /// Messages sent from this end so far
    pub fn sent(&self) -> Vec<String> {
        lock(&self.local.sent).clone()
    }

    /// Drains the log of sent messages
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut *lock(&self.local.sent))
    }

    /// Closes both ends; later sends fail with [`ChannelError::Closed`]
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Channel for MemoryChannel {
    fn send(&self, message: String) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        lock(&self.local.sent).push(message.clone());
        if let Some(peer) = &self.peer {
            peer.deliver(&message);
        }
        Ok(())
    }

    fn register_listener(&self, listener: Listener) {
        lock(&self.local.listeners).push(Arc::from(listener));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
