//! Outbound side: forwarding calls to the remote object

use crate::engine::BridgeInner;
use crate::RemoteError;
use bridge_codec::encode_args;
use bridge_types::{CallKey, ErrorCode, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Handle for calling methods on the remote side
///
/// Calls start eagerly: by the time a call method returns, the invocation
/// has been sent (or refused) and its timeout is running. The returned
/// [`PendingReply`] only waits.
#[derive(Clone)]
pub struct RemoteProxy {
    inner: Arc<BridgeInner>,
}

impl RemoteProxy {
    pub(crate) fn new(inner: Arc<BridgeInner>) -> Self {
        Self { inner }
    }

    /// Calls `method` with an already-structured argument list
    pub fn call(&self, method: &str, args: Vec<Value>) -> PendingReply {
        self.inner.start_call(method, Ok(args))
    }

    /// Calls `method` with any serializable argument sequence
    ///
    /// `args` is usually a tuple: `proxy.invoke("add", &(2, 3))`. If it
    /// cannot be encoded the call fails at once with `INVALID_ARGS` and
    /// nothing is sent.
    pub fn invoke<A: Serialize + ?Sized>(&self, method: &str, args: &A) -> PendingReply {
        self.inner.start_call(method, encode_args(args))
    }

    /// Like [`RemoteProxy::invoke`], decoding the result as `R`
    pub fn call_as<A, R>(
        &self,
        method: &str,
        args: A,
    ) -> impl Future<Output = Result<R, RemoteError>>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        self.invoke(method, &args).decode::<R>()
    }

    /// Returns a forwarder bound to one remote method name
    pub fn method(&self, name: impl Into<String>) -> RemoteMethod {
        RemoteMethod {
            proxy: self.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Debug for RemoteProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProxy").finish_non_exhaustive()
    }
}

/// A remote method bound by name
#[derive(Debug, Clone)]
pub struct RemoteMethod {
    proxy: RemoteProxy,
    name: String,
}

impl RemoteMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Vec<Value>) -> PendingReply {
        self.proxy.call(&self.name, args)
    }

    pub fn invoke<A: Serialize + ?Sized>(&self, args: &A) -> PendingReply {
        self.proxy.invoke(&self.name, args)
    }
}

/// The eventual outcome of one outbound call
///
/// Resolves exactly once: with the remote result, with the remote failure,
/// or with `REMOTE_TIMEOUT`.
#[must_use = "the reply is lost unless it is awaited"]
pub struct PendingReply {
    key: CallKey,
    state: ReplyState,
}

enum ReplyState {
    Failed(Option<RemoteError>),
    Waiting(oneshot::Receiver<Result<Value, RemoteError>>),
}

impl PendingReply {
    pub(crate) fn failed(key: CallKey, error: RemoteError) -> Self {
        Self {
            key,
            state: ReplyState::Failed(Some(error)),
        }
    }

    pub(crate) fn waiting(key: CallKey, reply: oneshot::Receiver<Result<Value, RemoteError>>) -> Self {
        Self {
            key,
            state: ReplyState::Waiting(reply),
        }
    }

    /// The correlation key allocated for this call
    pub fn key(&self) -> CallKey {
        self.key
    }

    /// Waits for the reply and decodes it as `R`
    ///
    /// A result that does not decode fails with `INVALID_RETURN`.
    pub async fn decode<R: DeserializeOwned>(self) -> Result<R, RemoteError> {
        let value = self.await?;
        serde_json::from_value(value)
            .map_err(|err| RemoteError::new(ErrorCode::InvalidReturn, err.to_string()))
    }
}

impl Future for PendingReply {
    type Output = Result<Value, RemoteError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            ReplyState::Failed(error) => Poll::Ready(Err(error.take().unwrap_or_else(|| {
                RemoteError::new(ErrorCode::RemoteRuntimeError, "reply already taken")
            }))),
            ReplyState::Waiting(reply) => Pin::new(reply).poll(cx).map(|outcome| {
                outcome.unwrap_or_else(|_| {
                    Err(RemoteError::new(
                        ErrorCode::RemoteTimeout,
                        "bridge dropped before the call settled",
                    ))
                })
            }),
        }
    }
}

impl fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            ReplyState::Failed(_) => "failed",
            ReplyState::Waiting(_) => "waiting",
        };
        f.debug_struct("PendingReply")
            .field("key", &self.key)
            .field("state", &state)
            .finish()
    }
}
