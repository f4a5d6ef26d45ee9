//! Construction-time configuration: timeout and observer hooks

use crate::BridgeError;
use bridge_types::{ErrorCode, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default reply window for outbound calls
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Bridge settings, fixed for the lifetime of a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long an outbound call may wait for its reply, in milliseconds
    pub timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Called with `(method, args)`
pub type InvokeObserver = Arc<dyn Fn(&str, &[Value]) + Send + Sync>;

/// Called with `(method, args, code, message)` when an outbound call fails
pub type RemoteErrorObserver = Arc<dyn Fn(&str, &[Value], ErrorCode, &str) + Send + Sync>;

/// Called for failures that belong to no call
pub type UnexpectedErrorObserver = Arc<dyn Fn(&BridgeError) + Send + Sync>;

/// Optional side-effect hooks
///
/// Return values are never consulted. Hooks run outside the bridge's
/// internal locks, so they may call back into the bridge.
#[derive(Clone, Default)]
pub struct Observers {
    remote_invoke_local: Option<InvokeObserver>,
    local_invoke_remote: Option<InvokeObserver>,
    remote_error: Option<RemoteErrorObserver>,
    unexpected_error: Option<UnexpectedErrorObserver>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires before a local method runs on behalf of the remote side
    pub fn on_remote_invoke_local(
        mut self,
        observer: impl Fn(&str, &[Value]) + Send + Sync + 'static,
    ) -> Self {
        self.remote_invoke_local = Some(Arc::new(observer));
        self
    }

    /// Fires when an invocation is sent to the remote side
    pub fn on_local_invoke_remote(
        mut self,
        observer: impl Fn(&str, &[Value]) + Send + Sync + 'static,
    ) -> Self {
        self.local_invoke_remote = Some(Arc::new(observer));
        self
    }

    /// Fires for every outbound call that settles as a failure
    ///
    /// To handle a single call's failure, inspect that call's result instead.
    pub fn on_remote_error(
        mut self,
        observer: impl Fn(&str, &[Value], ErrorCode, &str) + Send + Sync + 'static,
    ) -> Self {
        self.remote_error = Some(Arc::new(observer));
        self
    }

    /// Fires for malformed messages and internal failures
    ///
    /// Nothing can be recovered here; log or report the error.
    pub fn on_unexpected_error(
        mut self,
        observer: impl Fn(&BridgeError) + Send + Sync + 'static,
    ) -> Self {
        self.unexpected_error = Some(Arc::new(observer));
        self
    }

    pub(crate) fn remote_invoked_local(&self, method: &str, args: &[Value]) {
        if let Some(observer) = &self.remote_invoke_local {
            observer(method, args);
        }
    }

    pub(crate) fn local_invoked_remote(&self, method: &str, args: &[Value]) {
        if let Some(observer) = &self.local_invoke_remote {
            observer(method, args);
        }
    }

    pub(crate) fn remote_error(&self, method: &str, args: &[Value], code: ErrorCode, message: &str) {
        if let Some(observer) = &self.remote_error {
            observer(method, args, code, message);
        }
    }

    pub(crate) fn unexpected_error(&self, error: &BridgeError) {
        if let Some(observer) = &self.unexpected_error {
            observer(error);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("remote_invoke_local", &self.remote_invoke_local.is_some())
            .field("local_invoke_remote", &self.local_invoke_remote.is_some())
            .field("remote_error", &self.remote_error.is_some())
            .field("unexpected_error", &self.unexpected_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_timeout() {
        let config = BridgeConfig::default();
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_with_timeout() {
        let config = BridgeConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());

        let config: BridgeConfig = serde_json::from_str("{\"timeout_ms\": 100}").unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_unset_observers_are_silent() {
        let observers = Observers::new();
        observers.remote_invoked_local("add", &[]);
        observers.local_invoked_remote("add", &[]);
        observers.remote_error("add", &[], ErrorCode::RemoteTimeout, "late");
        observers.unexpected_error(&BridgeError::NoRuntime);
    }

    #[test]
    fn test_observers_fire() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let observers = Observers::new().on_remote_error(move |method, _, code, _| {
            assert_eq!(method, "add");
            assert_eq!(code, ErrorCode::InvalidArgs);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        observers.remote_error("add", &[], ErrorCode::InvalidArgs, "Args not serializable");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            format!("{:?}", observers),
            "Observers { remote_invoke_local: false, local_invoke_remote: false, remote_error: true, unexpected_error: false }"
        );
    }
}
