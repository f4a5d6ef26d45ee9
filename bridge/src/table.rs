//! Correlation table: bookkeeping for outbound calls awaiting a reply
//!
//! Every entry is removed at most once. Resolving or rejecting a key that
//! is no longer present is a no-op, which is what lets a reply and a
//! timeout race for the same key without further coordination.

use crate::{BridgeError, RemoteError};
use bridge_types::{CallKey, ErrorCode, Value};
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::trace;

/// Continuation that settles the caller's pending reply
pub type ReplySender = oneshot::Sender<Result<Value, RemoteError>>;

/// One outstanding outbound call
#[derive(Debug)]
pub struct PendingCall {
    /// Remote method name, kept for error reporting
    pub method: String,
    /// Arguments as sent, kept for error reporting
    pub args: Vec<Value>,
    reply: ReplySender,
    timer: Option<AbortHandle>,
}

impl PendingCall {
    pub fn new(method: impl Into<String>, args: Vec<Value>, reply: ReplySender) -> Self {
        Self {
            method: method.into(),
            args,
            reply,
            timer: None,
        }
    }

    /// Settles the call with a result
    pub fn resolve(self, value: Value) {
        self.settle(Ok(value));
    }

    /// Settles the call with a failure
    pub fn reject(self, code: ErrorCode, message: impl Into<String>) {
        self.settle(Err(RemoteError::new(code, message)));
    }

    fn settle(self, outcome: Result<Value, RemoteError>) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        if self.reply.send(outcome).is_err() {
            trace!(method = %self.method, "caller stopped waiting before the call settled");
        }
    }
}

/// Map from correlation key to pending call, plus the key allocator
#[derive(Debug)]
pub struct CorrelationTable {
    next_key: CallKey,
    entries: HashMap<CallKey, PendingCall>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            next_key: CallKey::FIRST,
            entries: HashMap::new(),
        }
    }

    /// Hands out the next key: 0, 1, 2, ...
    pub fn allocate_key(&mut self) -> CallKey {
        let key = self.next_key;
        self.next_key = key.next();
        key
    }

    /// Inserts an entry; never overwrites one that is still pending
    pub fn register(&mut self, key: CallKey, entry: PendingCall) -> Result<(), BridgeError> {
        if self.entries.contains_key(&key) {
            return Err(BridgeError::KeyInUse(key));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Stores the timeout timer for `key`
    ///
    /// If the call already settled the timer is aborted on the spot.
    pub fn attach_timer(&mut self, key: CallKey, timer: AbortHandle) {
        match self.entries.get_mut(&key) {
            Some(entry) => entry.timer = Some(timer),
            None => timer.abort(),
        }
    }

    /// Removes and returns the entry for `key`
    pub fn take(&mut self, key: CallKey) -> Option<PendingCall> {
        self.entries.remove(&key)
    }

    /// Resolves and removes the entry; returns `false` if none was pending
    pub fn resolve(&mut self, key: CallKey, value: Value) -> bool {
        match self.take(key) {
            Some(entry) => {
                entry.resolve(value);
                true
            }
            None => false,
        }
    }

    /// Reports to `observer`, then rejects and removes the entry
    ///
    /// Returns `false`, without calling `observer`, if none was pending.
    pub fn reject<F>(&mut self, key: CallKey, code: ErrorCode, message: &str, observer: F) -> bool
    where
        F: FnOnce(&str, &[Value], ErrorCode, &str),
    {
        match self.take(key) {
            Some(entry) => {
                observer(&entry.method, &entry.args, code, message);
                entry.reject(code, message);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: CallKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for CorrelationTable {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            if let Some(timer) = &entry.timer {
                timer.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn pending(method: &str) -> (PendingCall, oneshot::Receiver<Result<Value, RemoteError>>) {
        let (tx, rx) = oneshot::channel();
        (PendingCall::new(method, vec![json!(1)], tx), rx)
    }

    #[test]
    fn test_keys_are_monotonic_from_zero() {
        let mut table = CorrelationTable::new();
        let keys: Vec<u64> = (0..4).map(|_| table.allocate_key().get()).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_resolve_once() {
        let mut table = CorrelationTable::new();
        let key = table.allocate_key();
        let (entry, mut rx) = pending("add");
        table.register(key, entry).unwrap();
        assert!(table.contains(key));

        assert!(table.resolve(key, json!(5)));
        assert!(table.is_empty());
        assert_eq!(rx.try_recv().unwrap(), Ok(json!(5)));

        // Second settlement for the same key is a no-op
        assert!(!table.resolve(key, json!(6)));
    }

    #[test]
    fn test_reject_reports_then_removes() {
        let mut table = CorrelationTable::new();
        let key = table.allocate_key();
        let (entry, mut rx) = pending("slow");
        table.register(key, entry).unwrap();

        let mut seen = Vec::new();
        let rejected = table.reject(key, ErrorCode::RemoteTimeout, "late", |method, args, code, message| {
            seen.push((method.to_string(), args.to_vec(), code, message.to_string()));
        });

        assert!(rejected);
        assert_eq!(
            seen,
            vec![(
                "slow".to_string(),
                vec![json!(1)],
                ErrorCode::RemoteTimeout,
                "late".to_string()
            )]
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Err(RemoteError::new(ErrorCode::RemoteTimeout, "late"))
        );
    }

    #[test]
    fn test_reject_missing_key_skips_observer() {
        let mut table = CorrelationTable::new();
        let mut calls = 0;
        let rejected = table.reject(CallKey::new(99), ErrorCode::RemoteTimeout, "late", |_, _, _, _| {
            calls += 1;
        });
        assert!(!rejected);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_register_refuses_overwrite() {
        let mut table = CorrelationTable::new();
        let key = table.allocate_key();
        let (first, _rx1) = pending("a");
        let (second, _rx2) = pending("b");

        table.register(key, first).unwrap();
        assert!(matches!(
            table.register(key, second),
            Err(BridgeError::KeyInUse(k)) if k == key
        ));
        assert_eq!(table.take(key).unwrap().method, "a");
    }

    #[test]
    fn test_settling_after_caller_dropped_is_harmless() {
        let mut table = CorrelationTable::new();
        let key = table.allocate_key();
        let (entry, rx) = pending("add");
        table.register(key, entry).unwrap();
        drop(rx);

        assert!(table.resolve(key, json!(1)));
    }

    #[tokio::test]
    async fn test_settling_aborts_timer() {
        let mut table = CorrelationTable::new();
        let key = table.allocate_key();
        let (entry, _rx) = pending("add");
        table.register(key, entry).unwrap();

        let timer = tokio::spawn(tokio::time::sleep(Duration::from_secs(3600)));
        table.attach_timer(key, timer.abort_handle());
        assert!(table.resolve(key, json!(1)));

        assert!(timer.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_attach_timer_to_settled_key_aborts() {
        let mut table = CorrelationTable::new();
        let timer = tokio::spawn(tokio::time::sleep(Duration::from_secs(3600)));
        table.attach_timer(CallKey::new(7), timer.abort_handle());

        assert!(timer.await.unwrap_err().is_cancelled());
    }
}
