//! The local object a bridge exposes to its remote side
//!
//! Methods are registered by name up front. An invocation for a name that
//! was never registered is answered with `INVALID_METHOD` without running
//! anything.

use bridge_codec::MethodError;
use bridge_types::Value;
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Future returned by a registered method
pub type MethodFuture = BoxFuture<'static, Result<Value, MethodError>>;

/// A registered method handler
pub type Method = Arc<dyn Fn(Vec<Value>) -> MethodFuture + Send + Sync>;

/// Name-to-handler table for the methods the remote side may call
#[derive(Clone, Default)]
pub struct LocalObject {
    methods: HashMap<String, Method>,
}

impl LocalObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asynchronous method taking the raw argument list
    ///
    /// Registering a name twice replaces the earlier handler.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, MethodError>> + Send + 'static,
    {
        self.methods
            .insert(name.into(), Arc::new(move |args| handler(args).boxed()));
        self
    }

    /// Registers a method that completes synchronously
    pub fn sync_method<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, MethodError> + Send + Sync + 'static,
    {
        self.method(name, move |args| futures::future::ready(handler(args)))
    }

    /// Registers a method with typed arguments and return value
    ///
    /// The argument list is decoded as `A` (usually a tuple). A list that
    /// does not fit fails as a `TypeError`; a return value that cannot be
    /// encoded fails as [`MethodError::InvalidReturn`].
    pub fn typed_method<A, R, F, Fut>(self, name: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, MethodError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.method(name, move |args| {
            let handler = handler.clone();
            async move {
                let args: A = decode_args(args)?;
                let result = handler(args).await?;
                serde_json::to_value(result)
                    .map_err(|err| MethodError::InvalidReturn(err.to_string()))
            }
        })
    }

    pub fn get(&self, name: &str) -> Option<Method> {
        self.methods.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for LocalObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalObject")
            .field("methods", &self.names())
            .finish()
    }
}

fn decode_args<A: DeserializeOwned>(args: Vec<Value>) -> Result<A, MethodError> {
    let empty = args.is_empty();
    match serde_json::from_value(Value::Array(args)) {
        Ok(decoded) => Ok(decoded),
        // `()` only decodes from null
        Err(_) if empty => serde_json::from_value(Value::Null).map_err(type_error),
        Err(err) => Err(type_error(err)),
    }
}

fn type_error(err: serde_json::Error) -> MethodError {
    MethodError::named("TypeError", format!("invalid arguments: {}", err))
}

/// Runs a method to completion, turning a panic into a `Panic` failure
pub(crate) async fn run_method(method: Method, args: Vec<Value>) -> Result<Value, MethodError> {
    let future = match panic::catch_unwind(AssertUnwindSafe(|| method(args))) {
        Ok(future) => future,
        Err(payload) => return Err(panic_error(payload)),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(panic_error(payload)),
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> MethodError {
    MethodError::named("Panic", panic_message(payload.as_ref()))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
