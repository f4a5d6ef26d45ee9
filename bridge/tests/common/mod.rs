#![allow(dead_code)]

use bridge::{
    Bridge, BridgeError, ErrorCode, LocalObject, MemoryChannel, MethodError, Value,
};
use bridge_codec::{decode, Envelope};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

/// Routes bridge logs to the test output; filter with `RUST_LOG`
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Methods the test peers expose
pub fn calculator() -> LocalObject {
    LocalObject::new()
        .typed_method("add", |(a, b): (i64, i64)| async move { Ok(a + b) })
        .sync_method("fail", |_args| Err(MethodError::new("boom")))
        .typed_method("delayed", |(millis, value): (u64, Value)| async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(value)
        })
        .sync_method("nothing", |_args| Ok(Value::Null))
}

/// Everything the observers saw, in order
#[derive(Debug, Clone, Default)]
pub struct Seen {
    pub remote_invoke_local: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    pub local_invoke_remote: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    pub remote_errors: Arc<Mutex<Vec<(String, Vec<Value>, ErrorCode, String)>>>,
    pub unexpected: Arc<Mutex<Vec<String>>>,
}

impl Seen {
    pub fn remote_errors(&self) -> Vec<(String, Vec<Value>, ErrorCode, String)> {
        self.remote_errors.lock().unwrap().clone()
    }

    pub fn unexpected(&self) -> Vec<String> {
        self.unexpected.lock().unwrap().clone()
    }

    pub fn remote_invoke_local(&self) -> Vec<(String, Vec<Value>)> {
        self.remote_invoke_local.lock().unwrap().clone()
    }

    pub fn local_invoke_remote(&self) -> Vec<(String, Vec<Value>)> {
        self.local_invoke_remote.lock().unwrap().clone()
    }
}

/// Builds a bridge over `channel` with every observer recording into the returned `Seen`
pub fn observed_bridge(channel: MemoryChannel, local: LocalObject, timeout: Duration) -> (Bridge, Seen) {
    init_tracing();
    let seen = Seen::default();
    let (a, b, c, d) = (
        seen.remote_invoke_local.clone(),
        seen.local_invoke_remote.clone(),
        seen.remote_errors.clone(),
        seen.unexpected.clone(),
    );

    let bridge = Bridge::builder(channel)
        .local(local)
        .timeout(timeout)
        .on_remote_invoke_local(move |method, args| {
            a.lock().unwrap().push((method.to_string(), args.to_vec()));
        })
        .on_local_invoke_remote(move |method, args| {
            b.lock().unwrap().push((method.to_string(), args.to_vec()));
        })
        .on_remote_error(move |method, args, code, message| {
            c.lock()
                .unwrap()
                .push((method.to_string(), args.to_vec(), code, message.to_string()));
        })
        .on_unexpected_error(move |error: &BridgeError| {
            d.lock().unwrap().push(error.to_string());
        })
        .build()
        .expect("bridge should build inside a runtime");

    (bridge, seen)
}

/// Lets spawned tasks run until `channel` has sent `count` messages
pub async fn wait_for_sent(channel: &MemoryChannel, count: usize) -> Vec<String> {
    for _ in 0..1000 {
        let sent = channel.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {} sent messages, saw {:?}",
        count,
        channel.sent()
    );
}

/// Lets spawned tasks run for a while
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

pub fn decoded(message: &str) -> Envelope {
    decode(message)
        .expect("bridge message should decode")
        .expect("message should carry the bridge prefix")
}

/// Two bridges joined by an in-memory channel pair; the right side serves `calculator()`
pub struct Peers {
    pub left: Bridge,
    pub left_channel: MemoryChannel,
    pub left_seen: Seen,
    pub right: Bridge,
    pub right_channel: MemoryChannel,
    pub right_seen: Seen,
}

pub fn peers(timeout: Duration) -> Peers {
    let (left_channel, right_channel) = MemoryChannel::pair();
    let (left, left_seen) = observed_bridge(left_channel.clone(), LocalObject::new(), timeout);
    let (right, right_seen) = observed_bridge(right_channel.clone(), calculator(), timeout);
    Peers {
        left,
        left_channel,
        left_seen,
        right,
        right_channel,
        right_seen,
    }
}
