//! Bridge engine: inbound dispatch, outbound calls and their timeouts

use crate::config::{BridgeConfig, Observers};
use crate::local::{panic_message, run_method, LocalObject};
use crate::proxy::{PendingReply, RemoteProxy};
use crate::table::{CorrelationTable, PendingCall};
use crate::{BridgeError, Channel, RemoteError};
use bridge_codec::{
    decode, describe_error, encode_error, encode_invocation, encode_success, CodecError, Envelope,
    Invocation,
};
use bridge_types::{BridgeId, CallKey, ErrorCode, Value};
use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// A bridge wired to one channel
///
/// Exposes a [`LocalObject`] to the remote side and hands out
/// [`RemoteProxy`] handles for calling the remote side's methods.
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    pub fn builder(channel: impl Channel) -> BridgeBuilder {
        BridgeBuilder::new(channel)
    }

    pub fn id(&self) -> BridgeId {
        self.inner.id
    }

    /// Returns a handle for calling methods on the remote side
    pub fn remote(&self) -> RemoteProxy {
        RemoteProxy::new(self.inner.clone())
    }

    pub fn local(&self) -> &LocalObject {
        &self.inner.local
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Number of outbound calls still waiting for a reply
    pub fn pending_calls(&self) -> usize {
        self.inner.table().len()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.inner.id)
            .field("local", &self.inner.local)
            .field("config", &self.inner.config)
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

/// Collects everything a bridge is fixed with at construction
pub struct BridgeBuilder {
    channel: Box<dyn Channel>,
    local: LocalObject,
    config: BridgeConfig,
    observers: Observers,
    runtime: Option<Handle>,
}

impl BridgeBuilder {
    pub fn new(channel: impl Channel) -> Self {
        Self {
            channel: Box::new(channel),
            local: LocalObject::new(),
            config: BridgeConfig::default(),
            observers: Observers::new(),
            runtime: None,
        }
    }

    /// Sets the object whose methods the remote side may call
    pub fn local(mut self, local: LocalObject) -> Self {
        self.local = local;
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Runtime used for local method tasks and timeout timers
    ///
    /// Defaults to the runtime `build` is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    pub fn on_remote_invoke_local(
        mut self,
        observer: impl Fn(&str, &[Value]) + Send + Sync + 'static,
    ) -> Self {
        self.observers = self.observers.on_remote_invoke_local(observer);
        self
    }

    pub fn on_local_invoke_remote(
        mut self,
        observer: impl Fn(&str, &[Value]) + Send + Sync + 'static,
    ) -> Self {
        self.observers = self.observers.on_local_invoke_remote(observer);
        self
    }

    pub fn on_remote_error(
        mut self,
        observer: impl Fn(&str, &[Value], ErrorCode, &str) + Send + Sync + 'static,
    ) -> Self {
        self.observers = self.observers.on_remote_error(observer);
        self
    }

    pub fn on_unexpected_error(
        mut self,
        observer: impl Fn(&BridgeError) + Send + Sync + 'static,
    ) -> Self {
        self.observers = self.observers.on_unexpected_error(observer);
        self
    }

    /// Builds the bridge and registers its listener on the channel
    pub fn build(self) -> Result<Bridge, BridgeError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| BridgeError::NoRuntime)?,
        };

        let inner = Arc::new(BridgeInner {
            id: BridgeId::new(),
            channel: self.channel,
            local: self.local,
            table: Mutex::new(CorrelationTable::new()),
            config: self.config,
            observers: self.observers,
            runtime,
        });

        // The channel is owned by the engine, so the listener must not keep it alive.
        let weak = Arc::downgrade(&inner);
        inner.channel.register_listener(Box::new(move |message| {
            if let Some(inner) = weak.upgrade() {
                inner.on_message(message);
            }
        }));

        debug!(
            bridge = %inner.id,
            methods = ?inner.local.names(),
            timeout_ms = inner.config.timeout_ms,
            "bridge ready"
        );
        Ok(Bridge { inner })
    }
}

pub(crate) struct BridgeInner {
    id: BridgeId,
    channel: Box<dyn Channel>,
    local: LocalObject,
    table: Mutex<CorrelationTable>,
    config: BridgeConfig,
    observers: Observers,
    runtime: Handle,
}

impl BridgeInner {
    fn table(&self) -> MutexGuard<'_, CorrelationTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Listener entry point; never unwinds into the transport
    fn on_message(self: &Arc<Self>, message: String) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&message))) {
            self.report_unexpected(BridgeError::DispatchPanic(panic_message(payload.as_ref())));
        }
    }

    fn dispatch(self: &Arc<Self>, message: &str) {
        match decode(message) {
            Ok(None) => trace!(bridge = %self.id, "ignoring message without bridge prefix"),
            Ok(Some(Envelope::Success(reply))) => self.settle_success(reply.key, reply.result),
            Ok(Some(Envelope::Error(reply))) => {
                self.settle_failure(reply.key, reply.error_code, &reply.error_message)
            }
            Ok(Some(Envelope::Invocation(invocation))) => self.spawn_invocation(invocation),
            Err(err) => self.report_unexpected(err.into()),
        }
    }

    fn settle_success(&self, key: CallKey, result: Value) {
        if self.table().resolve(key, result) {
            trace!(bridge = %self.id, key = key.get(), "call resolved");
        } else {
            debug!(bridge = %self.id, key = key.get(), "ignoring reply for a settled call");
        }
    }

    fn settle_failure(&self, key: CallKey, code: ErrorCode, message: &str) {
        let entry = self.table().take(key);
        match entry {
            Some(entry) => {
                debug!(
                    bridge = %self.id,
                    key = key.get(),
                    method = %entry.method,
                    %code,
                    reason = message,
                    "call rejected"
                );
                self.observers
                    .remote_error(&entry.method, &entry.args, code, message);
                entry.reject(code, message);
            }
            None => debug!(
                bridge = %self.id,
                key = key.get(),
                %code,
                "ignoring failure for a settled call"
            ),
        }
    }

    fn spawn_invocation(self: &Arc<Self>, invocation: Invocation) {
        let inner = self.clone();
        self.runtime.spawn(async move {
            let outcome = AssertUnwindSafe(inner.execute_invocation(invocation))
                .catch_unwind()
                .await;
            if let Err(payload) = outcome {
                inner.report_unexpected(BridgeError::DispatchPanic(panic_message(
                    payload.as_ref(),
                )));
            }
        });
    }

    async fn execute_invocation(&self, invocation: Invocation) {
        let Invocation { method, args, key } = invocation;

        let reply = match self.local.get(&method) {
            None => {
                debug!(bridge = %self.id, key = key.get(), %method, "no such local method");
                encode_error(
                    ErrorCode::InvalidMethod,
                    &format!("Invalid method {}", method),
                    key,
                )
            }
            Some(handler) => {
                trace!(bridge = %self.id, key = key.get(), %method, "running local method");
                self.observers.remote_invoked_local(&method, &args);
                match run_method(handler, args).await {
                    Ok(result) => encode_success(&result, key).or_else(|err| {
                        encode_error(ErrorCode::InvalidReturn, &err.to_string(), key)
                    }),
                    Err(err) => encode_error(err.error_code(), &describe_error(&err), key),
                }
            }
        };

        match reply {
            Ok(message) => self.send_reply(key, message),
            Err(err) => self.report_unexpected(err.into()),
        }
    }

    fn send_reply(&self, key: CallKey, message: String) {
        if let Err(err) = self.channel.send(message) {
            warn!(bridge = %self.id, key = key.get(), error = %err, "failed to send reply");
            self.report_unexpected(err.into());
        }
    }

    /// Starts an outbound call: everything but the wait happens here
    pub(crate) fn start_call(
        self: &Arc<Self>,
        method: &str,
        args: Result<Vec<Value>, CodecError>,
    ) -> PendingReply {
        let key = self.table().allocate_key();

        let args = match args {
            Ok(args) => args,
            Err(err) => return self.refuse_call(key, method, &[], err.to_string()),
        };
        let message = match encode_invocation(method, &args, key) {
            Ok(message) => message,
            Err(err) => return self.refuse_call(key, method, &args, err.to_string()),
        };

        self.observers.local_invoked_remote(method, &args);

        // Register before sending so a fast reply always finds its entry.
        let (reply_tx, reply_rx) = oneshot::channel();
        let registered = self
            .table()
            .register(key, PendingCall::new(method, args, reply_tx));
        if let Err(err) = registered {
            let message = err.to_string();
            self.report_unexpected(err);
            return PendingReply::failed(
                key,
                RemoteError::new(ErrorCode::RemoteRuntimeError, message),
            );
        }

        trace!(bridge = %self.id, key = key.get(), %method, "sending invocation");
        if let Err(err) = self.channel.send(message) {
            warn!(bridge = %self.id, key = key.get(), %method, error = %err, "failed to send invocation");
            self.settle_failure(key, ErrorCode::InvalidArgs, &err.to_string());
            return PendingReply::waiting(key, reply_rx);
        }

        self.start_timer(key);
        PendingReply::waiting(key, reply_rx)
    }

    fn refuse_call(
        &self,
        key: CallKey,
        method: &str,
        args: &[Value],
        message: String,
    ) -> PendingReply {
        warn!(bridge = %self.id, key = key.get(), %method, reason = %message, "call not sent");
        self.observers
            .remote_error(method, args, ErrorCode::InvalidArgs, &message);
        PendingReply::failed(key, RemoteError::new(ErrorCode::InvalidArgs, message))
    }

    fn start_timer(self: &Arc<Self>, key: CallKey) {
        let timeout = self.config.timeout();
        let weak = Arc::downgrade(self);
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.settle_failure(
                    key,
                    ErrorCode::RemoteTimeout,
                    &format!("Remote timeout after {} ms", timeout.as_millis()),
                );
            }
        });
        self.table().attach_timer(key, timer.abort_handle());
    }

    fn report_unexpected(&self, error: BridgeError) {
        warn!(bridge = %self.id, %error, "unexpected bridge error");
        self.observers.unexpected_error(&error);
    }
}
