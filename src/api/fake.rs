//! Scripted in-memory transport for tests.

use super::envelope::Envelope;
use super::error::{AccessorError, ApiResult};
use super::{Operation, Transport};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum FakeReply {
    Data(Value),
    /// Callable answered with an `error` body
    ServerError(String),
    /// Stand-in for a network failure
    Unreachable,
}

#[derive(Debug, Clone)]
struct Scripted {
    delay: Duration,
    reply: FakeReply,
}

#[derive(Debug, Default)]
struct Inner {
    queued: HashMap<Operation, VecDeque<Scripted>>,
    fallback: HashMap<Operation, Scripted>,
    calls: Vec<(Operation, Value)>,
}

/// Replies are consumed in order per operation; once the queue is empty the
/// fallback reply (if any) repeats. Clones share the same script.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    inner: Arc<Mutex<Inner>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, operation: Operation, reply: FakeReply) {
        self.push_delayed(operation, Duration::ZERO, reply);
    }

    pub fn push_delayed(&self, operation: Operation, delay: Duration, reply: FakeReply) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .queued
            .entry(operation)
            .or_default()
            .push_back(Scripted { delay, reply });
    }

    pub fn always(&self, operation: Operation, reply: FakeReply) {
        let mut inner = self.inner.lock().unwrap();
        inner.fallback.insert(
            operation,
            Scripted {
                delay: Duration::ZERO,
                reply,
            },
        );
    }

    pub fn calls(&self) -> Vec<(Operation, Value)> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    fn next(&self, operation: Operation, payload: Value) -> Option<Scripted> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push((operation, payload));
        let queued = inner
            .queued
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(scripted) => Some(scripted),
            None => inner.fallback.get(&operation).cloned(),
        }
    }
}

impl Transport for FakeTransport {
    async fn call(&self, operation: Operation, payload: Value) -> ApiResult<Envelope<Value>> {
        let scripted = self.next(operation, payload);
        let Some(scripted) = scripted else {
            return Err(AccessorError::Malformed(format!(
                "no scripted reply for {}",
                operation.name()
            )));
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        match scripted.reply {
            FakeReply::Data(value) => Ok(Envelope::new(value)),
            FakeReply::ServerError(msg) => Err(AccessorError::Server(msg)),
            FakeReply::Unreachable => Err(AccessorError::Timeout(Duration::from_secs(15))),
        }
    }
}

/// Serve `router` on an ephemeral local port and return its base URL
pub(crate) async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
